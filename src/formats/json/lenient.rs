//! Comment and trailing-comma tolerance in front of `serde_json`.
//!
//! `//` and `/* */` comments outside string literals are dropped (newlines
//! inside block comments are kept so error positions stay on the right line)
//! and a comma directly before `}` or `]` is removed when a value precedes it. Everything else is left
//! for `serde_json` to judge.
use std::borrow::Cow;

pub fn relax(src: &str) -> Cow<'_, str> {
    if !src.contains('/') && !src.contains(',') {
        return Cow::Borrowed(src);
    }
    let mut out = String::with_capacity(src.len());
    let mut chars = src.chars().peekable();
    let mut in_string = false;
    let mut escaped = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '/' if chars.peek() == Some(&'/') => {
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        out.push('\n');
                    }
                    if prev == '*' && skipped == '/' {
                        break;
                    }
                    prev = skipped;
                }
                out.push(' ');
            }
            '}' | ']' => {
                let kept = out.trim_end().len();
                if out[..kept].ends_with(',') && follows_a_value(&out[..kept - 1]) {
                    out.remove(kept - 1);
                }
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    if out == src { Cow::Borrowed(src) } else { Cow::Owned(out) }
}

/// `[,]`, `{,}` and `[1,,]` keep their comma so the parser still rejects them.
fn follows_a_value(before_comma: &str) -> bool {
    !matches!(before_comma.trim_end().chars().last(), None | Some('[' | '{' | ','))
}
