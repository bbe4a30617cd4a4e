use crate::escape_text;
use html::{Token, TokenStream};

/// One line per token, with names resolved and text escaped.
pub fn format_tokens(stream: &TokenStream) -> Vec<String> {
    let atoms = stream.atoms();
    stream
        .iter()
        .map(|token| match token {
            Token::Doctype(name) => format!("DOCTYPE \"{}\"", escape_text(name)),
            Token::StartTag {
                name,
                attributes,
                self_closing,
            } => {
                let mut line = format!("START {}", atoms.resolve(*name));
                for (attr, value) in attributes {
                    match value {
                        Some(value) => line.push_str(&format!(
                            " {}=\"{}\"",
                            atoms.resolve(*attr),
                            escape_text(value)
                        )),
                        None => line.push_str(&format!(" {}", atoms.resolve(*attr))),
                    }
                }
                if *self_closing {
                    line.push_str(" /");
                }
                line
            }
            Token::EndTag(name) => format!("END {}", atoms.resolve(*name)),
            Token::Comment(text) => format!("COMMENT \"{}\"", escape_text(text)),
            Token::Text(text) => format!("TEXT \"{}\"", escape_text(text)),
        })
        .collect()
}
