//! User-visible message templates and the placeholder renderer.
//!
//! Placeholders use `{name}` syntax; `{{` and `}}` produce literal braces.
//! Rendering a placeholder with no supplied value is a fatal error rather
//! than a silent blank, so a broken template stops the run before anything
//! is posted.

use crate::error::TemplateError;

pub const SUBMISSION_TITLE: &str = "Giveaway time! {keys} keys up for grabs!";

pub const SUBMISSION_BODY: &str = "Hey everyone! I have a pile of spare keys and \
I would rather see them played than gathering dust, so I am giving them away \
right here. Leave a comment on this post and a bot will hand out keys while \
supplies last. One key per account.";

pub const KEYWORD_MESSAGE: &str =
    "To enter, your comment must contain the keyword `{keyword}` somewhere in its text.";

pub const RANDOM_RULE: &str = "Winners are drawn at random from everyone who has \
commented once the entry window closes, in {wait} minutes (around {utc}).";

pub const TIMESTAMP_RULE: &str =
    "Keys are handed out in comment-timestamp order, earliest first, while supplies last.";

pub const WHAT_IS_THIS: &str = "*This giveaway is run by giveawaybot. Accounts \
below the age or karma thresholds are skipped automatically, as is any account \
that has already received a key.*";

pub const PRIZE_REPLY_MESSAGE: &str = "Congratulations! Here is your key:\n\n    \
{prize}\n\nYou won it for your comment on {url}. Enjoy!";

pub const GENERIC_REPLY_MESSAGE: &str =
    "Congratulations, you won! Check your private messages for the key.";

pub const REPLY_TITLE: &str = "You won a giveaway!";

pub const END_MESSAGE: &str =
    "This giveaway is over. All keys have been distributed. Thanks for playing!";

/// Substitute `{name}` placeholders in `template` from `values`.
pub fn render(template: &str, values: &[(&str, &str)]) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' => {
                if chars.peek() == Some(&'{') {
                    chars.next();
                    out.push('{');
                    continue;
                }
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(inner) => name.push(inner),
                        None => return Err(TemplateError::UnbalancedBraces),
                    }
                }
                match values.iter().find(|(key, _)| *key == name) {
                    Some((_, value)) => out.push_str(value),
                    None => return Err(TemplateError::MissingValue { name }),
                }
            }
            '}' => {
                if chars.peek() == Some(&'}') {
                    chars.next();
                    out.push('}');
                } else {
                    return Err(TemplateError::UnbalancedBraces);
                }
            }
            _ => out.push(c),
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_substitutes_placeholders() {
        let rendered = render(
            PRIZE_REPLY_MESSAGE,
            &[("prize", "AAAA-BBBB-CCCC"), ("url", "https://redd.it/abc123")],
        )
        .unwrap();
        assert!(rendered.contains("AAAA-BBBB-CCCC"));
        assert!(rendered.contains("https://redd.it/abc123"));
        assert!(!rendered.contains('{'));
    }

    #[test]
    fn test_render_missing_value_is_fatal() {
        let err = render(PRIZE_REPLY_MESSAGE, &[("prize", "AAAA")]).unwrap_err();
        assert_eq!(
            err,
            TemplateError::MissingValue {
                name: "url".to_string()
            }
        );
    }

    #[test]
    fn test_render_escaped_braces() {
        let rendered = render("{{literal}} and {value}", &[("value", "x")]).unwrap();
        assert_eq!(rendered, "{literal} and x");
    }

    #[test]
    fn test_render_unbalanced_braces() {
        assert_eq!(
            render("broken {placeholder", &[]).unwrap_err(),
            TemplateError::UnbalancedBraces
        );
        assert_eq!(
            render("broken } brace", &[]).unwrap_err(),
            TemplateError::UnbalancedBraces
        );
    }

    #[test]
    fn test_title_formats_key_count() {
        let rendered = render(SUBMISSION_TITLE, &[("keys", "25")]).unwrap();
        assert_eq!(rendered, "Giveaway time! 25 keys up for grabs!");
    }
}
