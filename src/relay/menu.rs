//! `/start` greeting and the main reply keyboard.

use teloxide::types::{KeyboardButton, KeyboardMarkup};

pub const MENU_LABELS: [&str; 5] = [
    "Check order",
    "Leave review",
    "Track package",
    "Support",
    "Care tips",
];

const MENU_COLUMNS: usize = 2;

pub fn greeting(first_name: &str) -> String {
    format!(
        "👋 Hi, {first_name}!\n\n\
         I'm the ASHIM Assistant. I help with orders, reviews and customer questions on Wildberries."
    )
}

pub fn main_menu() -> KeyboardMarkup {
    let rows: Vec<Vec<KeyboardButton>> = MENU_LABELS
        .chunks(MENU_COLUMNS)
        .map(|row| row.iter().copied().map(KeyboardButton::new).collect())
        .collect();
    KeyboardMarkup::new(rows).resize_keyboard()
}

/// True for `/start` and `/start <payload>`, and for `/start@name` when `name`
/// is this bot. A mention is only accepted blindly if our username is unknown.
pub fn is_start_command(text: &str, bot_username: Option<&str>) -> bool {
    let command = text.split_whitespace().next().unwrap_or("");
    match command.split_once('@') {
        None => command == "/start",
        Some((name, mention)) => {
            name == "/start"
                && bot_username.is_none_or(|ours| {
                    mention.eq_ignore_ascii_case(ours.trim_start_matches('@'))
                })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greeting_names_user() {
        let text = greeting("Alice");
        assert!(text.contains("Alice"));
        assert!(text.contains("ASHIM Assistant"));
    }

    #[test]
    fn test_menu_has_five_labels_two_per_row() {
        let menu = main_menu();
        let rows: Vec<Vec<&str>> = menu
            .keyboard
            .iter()
            .map(|row| row.iter().map(|b| b.text.as_str()).collect())
            .collect();

        assert_eq!(
            rows,
            vec![
                vec!["Check order", "Leave review"],
                vec!["Track package", "Support"],
                vec!["Care tips"],
            ]
        );
        assert!(menu.resize_keyboard);
    }

    #[test]
    fn test_start_command_detection() {
        let me = Some("ashim_bot");
        assert!(is_start_command("/start", me));
        assert!(is_start_command("  /start", me));
        assert!(is_start_command("/start promo42", me));

        assert!(!is_start_command("/started", me));
        assert!(!is_start_command("start", me));
        assert!(!is_start_command("please /start", me));
        assert!(!is_start_command("", me));
    }

    #[test]
    fn test_start_mention_must_name_this_bot() {
        let me = Some("ashim_bot");
        assert!(is_start_command("/start@ashim_bot", me));
        assert!(is_start_command("/start@Ashim_Bot promo42", me));
        assert!(is_start_command("/start@ashim_bot", Some("@ashim_bot")));

        assert!(!is_start_command("/start@other_bot", me));
        assert!(!is_start_command("/start@", me));
        assert!(!is_start_command("/started@ashim_bot", me));
    }

    #[test]
    fn test_start_mention_accepted_when_username_unknown() {
        assert!(is_start_command("/start@whoever_bot", None));
        assert!(!is_start_command("/stop@whoever_bot", None));
    }
}
