//! Text line protocol spoken by the button console.
//!
//! Inbound: `Button {1|2|3} Pressed`, matched case-insensitively anywhere in
//! the line; everything else is ignored. Outbound: `LED{n} {ON|OFF}` and a
//! bare decimal debounce interval in milliseconds. Newline framing only.

use super::ButtonId;

/// Parse an inbound line into a button press, if it is one.
pub fn parse_press_line(line: &str) -> Option<ButtonId> {
    let lower = line.to_ascii_lowercase();
    for button in ButtonId::ALL {
        let needle = format!("button {} pressed", button.number());
        if lower.contains(&needle) {
            return Some(button);
        }
    }
    None
}

/// Outbound LED command for one button's indicator.
pub fn led_line(button: ButtonId, on: bool) -> String {
    format!("LED{} {}", button.number(), if on { "ON" } else { "OFF" })
}

/// Outbound debounce configuration line.
pub fn button_delay_line(ms: u32) -> String {
    ms.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_exact_line() {
        assert_eq!(parse_press_line("Button 1 Pressed"), Some(ButtonId::Button1));
        assert_eq!(parse_press_line("Button 2 Pressed"), Some(ButtonId::Button2));
        assert_eq!(parse_press_line("Button 3 Pressed"), Some(ButtonId::Button3));
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(parse_press_line("BUTTON 2 PRESSED"), Some(ButtonId::Button2));
        assert_eq!(parse_press_line("button 3 pressed"), Some(ButtonId::Button3));
    }

    #[test]
    fn test_parse_matches_substring_and_ignores_rest() {
        assert_eq!(
            parse_press_line("dbg: Button 1 Pressed (t=1234)"),
            Some(ButtonId::Button1)
        );
    }

    #[test]
    fn test_parse_rejects_noise() {
        assert_eq!(parse_press_line(""), None);
        assert_eq!(parse_press_line("Button 4 Pressed"), None);
        assert_eq!(parse_press_line("Button 1 Released"), None);
        assert_eq!(parse_press_line("ready"), None);
    }

    #[test]
    fn test_led_line_format() {
        assert_eq!(led_line(ButtonId::Button1, true), "LED1 ON");
        assert_eq!(led_line(ButtonId::Button3, false), "LED3 OFF");
    }

    #[test]
    fn test_button_delay_line_format() {
        assert_eq!(button_delay_line(200), "200");
    }
}
