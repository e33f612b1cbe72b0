use filestore_sync_core::path::{
    decode_component, encode_component, normalize_remote_id, split_parent, to_id,
};

#[test]
fn encode_component_keeps_unreserved_characters() {
    assert_eq!(encode_component("abc-_.!~*'()XYZ09"), "abc-_.!~*'()XYZ09");
    assert_eq!(encode_component("/sub/a b.txt"), "%2Fsub%2Fa%20b.txt");
    assert_eq!(encode_component("ä"), "%C3%A4");
}

#[test]
fn decode_component_reverses_escaping() {
    assert_eq!(decode_component("a%20b%2Fc"), "a b/c");
    assert_eq!(decode_component("plain"), "plain");
}

#[test]
fn strips_plain_container_prefix() {
    assert_eq!(normalize_remote_id("ZAPP%2findex.html", "ZAPP"), "/index.html");
    assert_eq!(
        normalize_remote_id("ZAPP%2fview%2fMain.view.xml", "ZAPP"),
        "/view/Main.view.xml"
    );
}

#[test]
fn strips_namespaced_container_with_escaped_slashes() {
    // "/NS/APP" encodes to "%2FNS%2FAPP"; the server reports the prefix lower-cased.
    assert_eq!(
        normalize_remote_id("%2fNS%2fAPP%2fi18n%2fi18n.properties", "/NS/APP"),
        "/i18n/i18n.properties"
    );
    assert_eq!(normalize_remote_id("%2fNS%2fAPP%2fsub", "/NS/APP"), "/sub");
}

#[test]
fn namespaced_container_only_upper_cases_the_prefix_slashes() {
    // Only the first two escaped slashes belong to the namespace prefix.
    assert_eq!(
        normalize_remote_id("%2fNS%2fAPP%2fa%2fb%2fc.js", "/NS/APP"),
        "/a/b/c.js"
    );
}

#[test]
fn decodes_escaped_characters_inside_segments() {
    assert_eq!(
        normalize_remote_id("ZAPP%2fmy%20folder%2fa%2Bb.txt", "ZAPP"),
        "/my folder/a+b.txt"
    );
}

#[test]
fn split_parent_separates_last_segment() {
    assert_eq!(split_parent("/sub/b.txt"), ("/sub", "b.txt"));
    assert_eq!(split_parent("/a.txt"), ("", "a.txt"));
    assert_eq!(split_parent("/a/b/c"), ("/a/b", "c"));
}

#[test]
fn to_id_normalises_separators() {
    assert_eq!(to_id("a/b.txt", '/'), "/a/b.txt");
    assert_eq!(to_id("./a//b.txt", '/'), "/a/b.txt");
    assert_eq!(to_id(r"sub\file.js", '\\'), "/sub/file.js");
    assert_eq!(to_id("", '/'), "/");
}
