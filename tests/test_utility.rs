use apicize_transcode::{
    dedent_lines, generate_uuid, indent_lines, line_indentation, slugify,
    template_continuation_lines, to_single_quoted, unescape_js_string,
};

// =============================================================================
// generate_uuid
// =============================================================================

#[test]
fn test_generate_uuid_returns_valid_uuid() {
    let id = generate_uuid();
    assert!(!id.is_empty());
    // UUID v4 format: 8-4-4-4-12 hex chars
    assert_eq!(id.len(), 36);
    assert_eq!(id.chars().filter(|c| *c == '-').count(), 4);
}

#[test]
fn test_generate_uuid_is_unique() {
    let id1 = generate_uuid();
    let id2 = generate_uuid();
    assert_ne!(id1, id2);
}

// =============================================================================
// slugify
// =============================================================================

#[test]
fn test_slugify_lowercases_and_dashes() {
    assert_eq!(slugify("List Users"), "list-users");
    assert_eq!(slugify("  Create / Update (v2)!  "), "create-update-v2");
    assert_eq!(slugify("already-slugged"), "already-slugged");
}

#[test]
fn test_slugify_empty_is_unnamed() {
    assert_eq!(slugify(""), "unnamed");
    assert_eq!(slugify("!!!"), "unnamed");
    assert_eq!(slugify("日本"), "unnamed");
}

// =============================================================================
// string literals
// =============================================================================

#[test]
fn test_to_single_quoted_escapes() {
    assert_eq!(to_single_quoted("plain"), "'plain'");
    assert_eq!(to_single_quoted("it's"), "'it\\'s'");
    assert_eq!(to_single_quoted("a\\b"), "'a\\\\b'");
    assert_eq!(to_single_quoted("line\nbreak\ttab"), "'line\\nbreak\\ttab'");
    assert_eq!(to_single_quoted("\u{1}"), "'\\u0001'");
    assert_eq!(to_single_quoted("\"double\""), "'\"double\"'");
}

#[test]
fn test_unescape_js_string() {
    assert_eq!(unescape_js_string("it\\'s").as_deref(), Some("it's"));
    assert_eq!(unescape_js_string("a\\nb\\tc").as_deref(), Some("a\nb\tc"));
    assert_eq!(unescape_js_string("\\x41\\u0042\\u{43}").as_deref(), Some("ABC"));
    assert_eq!(unescape_js_string("\\uD83D\\uDE00").as_deref(), Some("😀"));
    assert_eq!(unescape_js_string("con\\\ntinued").as_deref(), Some("continued"));
    assert_eq!(unescape_js_string("\\q").as_deref(), Some("q"));
}

#[test]
fn test_unescape_js_string_rejects_invalid_escapes() {
    assert_eq!(unescape_js_string("trailing\\"), None);
    assert_eq!(unescape_js_string("\\x4"), None);
    assert_eq!(unescape_js_string("\\uZZZZ"), None);
    assert_eq!(unescape_js_string("\\uD83D"), None);
}

#[test]
fn test_quoting_is_reversible() {
    for text in ["", "plain", "it's \"quoted\"", "multi\nline\r\n", "back\\slash", "\u{2028}"] {
        let quoted = to_single_quoted(text);
        let body = &quoted[1..quoted.len() - 1];
        assert_eq!(unescape_js_string(body).as_deref(), Some(text));
    }
}

// =============================================================================
// indentation
// =============================================================================

#[test]
fn test_indent_lines_skips_empty_lines() {
    assert_eq!(indent_lines("a\n\nb", "    ", &[]), "    a\n\n    b");
    assert_eq!(indent_lines("", "  ", &[]), "");
}

#[test]
fn test_dedent_lines_removes_only_matching_prefix() {
    assert_eq!(dedent_lines("    a\n  b\n    c", "    ", &[]), "a\n  b\nc");
    assert_eq!(dedent_lines("  a", "", &[]), "  a");
}

#[test]
fn test_verbatim_lines_are_left_alone() {
    let flags = [false, true, false];
    assert_eq!(indent_lines("a\n b\nc", "  ", &flags), "  a\n b\n  c");
    assert_eq!(dedent_lines("  a\n   b\n  c", "  ", &flags), "a\n   b\nc");
}

#[test]
fn test_template_continuation_lines() {
    let script = "const x = `a\n  b`;\nconst y = 'c';\nconst z = `${`d\ne`}\n`;";
    assert_eq!(
        template_continuation_lines(script),
        vec![false, true, false, false, true, true]
    );
    assert_eq!(template_continuation_lines("expect(1)\n  .to.equal(1)"), vec![false, false]);
    // unparsable scripts are treated as plain lines
    assert_eq!(template_continuation_lines("const x = `a\n"), vec![false, false]);
}

#[test]
fn test_line_indentation() {
    let text = "first\n    second\n\tthird";
    assert_eq!(line_indentation(text, 0), "");
    assert_eq!(line_indentation(text, text.find("second").unwrap()), "    ");
    assert_eq!(line_indentation(text, text.find("third").unwrap()), "\t");
}
