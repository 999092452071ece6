use super::ui::{self, StyleType};
use crate::core::notify::{Notification, NotificationContext, Notifier};

/// Prints notifications to the terminal, prefixed by their context.
pub struct ConsoleNotifier;

impl ConsoleNotifier {
    pub fn render(notification: &Notification) -> String {
        let text = notification.to_string();
        let styled = if text.starts_with("ERROR") {
            ui::style_text(&text, StyleType::Error)
        } else if text.starts_with("WARNING") {
            ui::style_text(&text, StyleType::Warning)
        } else {
            text
        };
        match notification.context() {
            NotificationContext::Currency => format!("\n-- Currency Notification: {styled}"),
            NotificationContext::General => format!("\n{styled}"),
        }
    }
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        println!("{}", Self::render(&notification));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_prefixes_currency_context() {
        console::set_colors_enabled(false);
        let rendered = ConsoleNotifier::render(&Notification::RateNotFound("CAD".parse().unwrap()));
        assert_eq!(
            rendered,
            "\n-- Currency Notification: ERROR: Exchange rate not found for CAD."
        );

        let rendered = ConsoleNotifier::render(&Notification::ReturningToMenu);
        assert_eq!(rendered, "\nReturning to the main menu...");
    }
}
