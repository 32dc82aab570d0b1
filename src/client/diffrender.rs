//! Unified diff text rendering for `anchor diff` / `anchor show`.

use similar::TextDiff;

/// Renders a unified diff between `old` and `new` bytes under `path`. Falls
/// back to a one-line binary notice when either side isn't UTF-8.
pub fn unified(path: &str, old: &[u8], new: &[u8]) -> String {
    let (Ok(old_text), Ok(new_text)) = (std::str::from_utf8(old), std::str::from_utf8(new)) else {
        return format!("Binary files differ: {path}\n");
    };
    if old_text == new_text {
        return String::new();
    }

    let diff = TextDiff::from_lines(old_text, new_text);
    diff.unified_diff()
        .context_radius(3)
        .header(&format!("a/{path}"), &format!("b/{path}"))
        .to_string()
}

pub fn added_file(path: &str, contents: &[u8]) -> String {
    unified(path, b"", contents)
}

pub fn removed_file(path: &str, contents: &[u8]) -> String {
    unified(path, contents, b"")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn identical_text_yields_empty_diff() {
        assert_eq!(unified("a.txt", b"same\n", b"same\n"), "");
    }

    #[test]
    fn changed_line_appears_in_unified_diff() {
        let rendered = unified("a.txt", b"one\ntwo\n", b"one\nTHREE\n");
        assert!(rendered.contains("-two"));
        assert!(rendered.contains("+THREE"));
    }

    #[test]
    fn binary_content_reports_a_notice() {
        let rendered = unified("bin.dat", &[0xff, 0x00], &[0x00, 0xff]);
        assert_eq!(rendered, "Binary files differ: bin.dat\n");
    }
}
