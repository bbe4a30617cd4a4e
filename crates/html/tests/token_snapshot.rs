use html::tokenize;
use html_test_support::diff_lines;
use html_test_support::token_snapshot::format_tokens;

fn lines(expected: &[&str]) -> Vec<String> {
    expected.iter().map(|s| s.to_string()).collect()
}

fn assert_tokens(input: &str, expected: &[&str]) {
    let actual = format_tokens(&tokenize(input));
    let expected = lines(expected);
    assert!(
        actual == expected,
        "token snapshot mismatch for {input:?}\n{}",
        diff_lines(&expected, &actual)
    );
}

#[test]
fn pasted_word_fragment() {
    assert_tokens(
        r#"<P class=MsoNormal style="margin:0">a&nbsp;b<o:p></o:p></P><!--[if gte mso 9]>x<![endif]-->"#,
        &[
            r#"START p class="MsoNormal" style="margin:0""#,
            "TEXT \"a\u{a0}b\"",
            "START o:p",
            "END o:p",
            "END p",
            "COMMENT \"[if gte mso 9]>x<![endif]\"",
        ],
    );
}

#[test]
fn editor_markers_and_placeholders() {
    assert_tokens(
        "<p class=\"__se__format__free_x\">&#8203;<br/></p><span contenteditable=false>k</span>",
        &[
            r#"START p class="__se__format__free_x""#,
            "TEXT \"\\u{200B}\"",
            "START br /",
            "END p",
            r#"START span contenteditable="false""#,
            "TEXT \"k\"",
            "END span",
        ],
    );
}

#[test]
fn doctype_and_bare_attributes() {
    assert_tokens(
        "<!DOCTYPE html><input disabled value='x'>",
        &["DOCTYPE \"DOCTYPE html\"", r#"START input disabled value="x" /"#],
    );
}
