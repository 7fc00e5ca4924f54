/// Makes arbitrary text safe to place inside a Mermaid node or edge label.
///
/// Shape and edge delimiters and quotes are replaced with Mermaid entity codes;
/// every whitespace or control character other than a plain space becomes a
/// single space.
pub fn sanitize_label(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match escape(ch) {
            Some(code) => out.push_str(code),
            None if ch != ' ' && (ch.is_whitespace() || ch.is_control()) => out.push(' '),
            None => out.push(ch),
        }
    }
    out
}

pub fn is_metachar(ch: char) -> bool {
    escape(ch).is_some() || (ch != ' ' && (ch.is_whitespace() || ch.is_control()))
}

fn escape(ch: char) -> Option<&'static str> {
    let code = match ch {
        '[' => "#91;",
        ']' => "#93;",
        '{' => "#123;",
        '}' => "#125;",
        '(' => "#40;",
        ')' => "#41;",
        '|' => "#124;",
        '"' => "#quot;",
        '\'' => "#39;",
        '`' => "#96;",
        '<' => "#lt;",
        '>' => "#gt;",
        _ => return None,
    };
    Some(code)
}
