//! Behavior of the typed-value operators.

use cutlet::{CollectPrint, Interpreter, NoPrint};
use pretty_assertions::assert_eq;

fn run(code: &str) -> String {
    let output = CollectPrint::new();
    let buffer = output.buffer();
    let mut interp = Interpreter::with_output(Box::new(output));
    interp.run(code).expect("script runs cleanly");
    let result = buffer.borrow().clone();
    result
}

fn run_err_message(code: &str) -> String {
    let mut interp = Interpreter::with_output(Box::new(NoPrint));
    let err = interp.run(code).expect_err("script must fail");
    err.message().to_owned()
}

// ----- strings --------------------------------------------------------

#[test]
fn string_type_and_length() {
    assert_eq!(run("local s = abc\nprint [$s type] [$s length]"), "string 3\n");
}

#[test]
fn string_comparisons() {
    assert_eq!(run("local s = abc\nprint [$s == abc] [$s <> abc]"), "true false\n");
    assert_eq!(run("local s = abc\nprint [$s < abd] [$s >= abd]"), "true false\n");
}

#[test]
fn string_startswith_endswith_find() {
    let code = "local s = \"hello world\"\n\
                print [$s startswith hello] [$s endswith world] [$s find lo]\n";
    assert_eq!(run(code), "true true true\n");
}

#[test]
fn string_index_is_one_based_and_utf8_aware() {
    assert_eq!(run("local s = \"héllo\"\nprint [$s index 2]"), "é\n");
    assert_eq!(run("local s = \"héllo\"\nprint [$s index -1]"), "o\n");
    assert_eq!(run("local s = \"héllo\"\nprint [$s index -5]"), "h\n");
}

#[test]
fn string_index_out_of_range_fails() {
    assert!(run_err_message("local s = abc\n$s index 4").contains("out of range"));
    assert!(run_err_message("local s = abc\n$s index 0").contains("out of range"));
    assert!(run_err_message("local s = abc\n$s index -4").contains("out of range"));
}

#[test]
fn string_every_valid_index_yields_a_character() {
    // For a string of length N, every index in [1..N] and [-N..-1] works.
    let code = "local s = \"αβγ\"\n\
                print [$s index 1] [$s index 2] [$s index 3]\n\
                print [$s index -3] [$s index -2] [$s index -1]\n";
    assert_eq!(run(code), "α β γ\nα β γ\n");
}

#[test]
fn string_substr() {
    assert_eq!(run("local s = \"héllo\"\nprint [$s substr 1 3]"), "hé\n");
    assert_eq!(run("local s = \"héllo\"\nprint [$s substr 2 -1]"), "éll\n");
}

#[test]
fn string_insert_mutates_in_place() {
    assert_eq!(run("local s = \"ac\"\n$s insert 2 b\nprint $s"), "abc\n");
}

#[test]
fn string_unknown_operator_falls_through_to_commands() {
    // The string's text is treated as a command name.
    let code = "def shout {word} { print \"$word!\" }\n\
                local cmd = shout\n\
                $cmd hey\n";
    assert_eq!(run(code), "hey!\n");
}

// ----- lists ----------------------------------------------------------

#[test]
fn list_append_grows_by_one() {
    let code = "local xs = [list a b]\n$xs append c\nprint [$xs size]\nprint [$xs join]\n";
    assert_eq!(run(code), "3\na b c\n");
}

#[test]
fn list_prepend_grows_by_one() {
    let code = "local xs = [list b c]\n$xs prepend a\nprint [$xs size] [$xs join -]\n";
    assert_eq!(run(code), "3\na-b-c\n");
}

#[test]
fn list_extend_concatenates() {
    let code = "local xs = [list 1 2]\nlocal ys = [list 3 4]\n$xs extend $ys\nprint [$xs join]\n";
    assert_eq!(run(code), "1 2 3 4\n");
}

#[test]
fn list_reverse_twice_is_identity() {
    let code = "local xs = [list {3 1 2}]\n$xs reverse\n$xs reverse\nprint [$xs join]\n";
    assert_eq!(run(code), "3 1 2\n");
}

#[test]
fn list_sort_is_lexicographic() {
    let code = "local xs = [list banana apple cherry]\n$xs sort\nprint [$xs join]\n";
    assert_eq!(run(code), "apple banana cherry\n");
}

#[test]
fn list_sort_with_comparator() {
    let code = "def descending {a b} { return [expr $a > $b] }\n\
                local xs = [list b c a]\n$xs sort descending\nprint [$xs join]\n";
    assert_eq!(run(code), "c b a\n");
}

#[test]
fn list_unique_sorts_and_dedupes() {
    let code = "local xs = [list b a c a b]\n$xs unique\nprint [$xs join]\n";
    assert_eq!(run(code), "a b c\n");
}

#[test]
fn list_index_reads_and_writes() {
    let code = "local xs = [list a b c]\nprint [$xs index 2]\n\
                $xs index 2 = B\nprint [$xs join]\nprint [$xs index -1]\n";
    assert_eq!(run(code), "b\na B c\nc\n");
}

#[test]
fn list_index_out_of_range_fails() {
    assert!(run_err_message("local xs = [list a b]\n$xs index 3").contains("out of range"));
}

#[test]
fn list_remove() {
    let code = "local xs = [list a b c d]\n$xs remove 2\nprint [$xs join]\n";
    assert_eq!(run(code), "a c d\n");
}

#[test]
fn list_clear_and_size() {
    let code = "local xs = [list a b]\n$xs clear\nprint [$xs size]\n";
    assert_eq!(run(code), "0\n");
}

#[test]
fn list_equality_compares_elements() {
    let code = "local xs = [list 1 2]\nlocal ys = [list {1 2}]\nlocal zs = [list 1 3]\n\
                print [$xs == $ys] [$xs == $zs] [$xs <> $zs]\n";
    assert_eq!(run(code), "true false true\n");
}

#[test]
fn nested_list_literals() {
    let code = "local xs = [list {a {b c} d}]\nprint [$xs size]\n";
    assert_eq!(run(code), "3\n");
}

#[test]
fn list_coerces_to_braced_text() {
    assert_eq!(run("print [list a b c]"), "{a b c}\n");
}

#[test]
fn list_foreach_respects_break() {
    let code = "local xs = [list 1 2 3 4]\n\
                $xs foreach x { if {$x == 3} { break }; print $x }\n";
    assert_eq!(run(code), "1\n2\n");
}

#[test]
fn list_unknown_operator_fails() {
    assert!(run_err_message("local xs = [list a]\n$xs frobnicate")
        .contains("Unknown operator frobnicate for list variable."));
}

// ----- booleans -------------------------------------------------------

#[test]
fn boolean_constants_and_not() {
    assert_eq!(run("local t = [true]\nprint [$t type] [$t not]"), "boolean false\n");
}

#[test]
fn boolean_binary_operators() {
    let code = "local t = [true]\nlocal f = [false]\n\
                print [$t and $f] [$t or $f] [$t xor $t] [$t nand $t] [$f nor $f]\n";
    assert_eq!(run(code), "false true false false true\n");
}

#[test]
fn boolean_coercion_from_strings() {
    let code = "local t = [true]\nprint [$t and yes] [$t and 0] [$t and {}]\n";
    assert_eq!(run(code), "true false false\n");
}

#[test]
fn boolean_unknown_operator_fails() {
    assert!(run_err_message("local t = [true]\n$t wat")
        .contains("Unknown operator wat for boolean variable."));
}
