use facet::Facet;
use facet_temple::{
    CompareOptions, Comparison, TempleErrorKind, compare, compare_with, diff_trees, shape_tree,
    template_tree, validate,
};
use facet_temple_testhelpers::template_set;
use indoc::indoc;

#[derive(Facet)]
#[facet(rename_all = "PascalCase")]
struct Person {
    name: String,
    address: Address,
}

#[derive(Facet)]
#[facet(rename_all = "PascalCase")]
struct Address {
    city: String,
}

fn person() -> Person {
    Person {
        name: "Ada".into(),
        address: Address {
            city: "London".into(),
        },
    }
}

fn comparison(missing: &[&str], extra: &[&str]) -> Comparison {
    Comparison {
        missing: missing.iter().map(|s| s.to_string()).collect(),
        extra: extra.iter().map(|s| s.to_string()).collect(),
    }
}

fn template_paths(sources: &[(&str, &str)], name: &str) -> Vec<String> {
    template_paths_with(sources, name, &CompareOptions::default())
}

fn template_paths_with(
    sources: &[(&str, &str)],
    name: &str,
    options: &CompareOptions,
) -> Vec<String> {
    let set = template_set(sources);
    template_tree(&set, name, options).unwrap().paths()
}

fn following_expressions() -> CompareOptions {
    CompareOptions::new().follow_expressions(true)
}

// ----------------------------------------------------------------------------
// Person / Address scenario
// ----------------------------------------------------------------------------

#[test]
fn exact_match_has_no_differences() {
    facet_temple_testhelpers::setup();

    let set = template_set(&[("page", "{{ .Name }} lives in {{ .Address.City }}")]);
    let result = compare(&person(), &set, "page").unwrap();
    assert_eq!(result, comparison(&[], &[]));
    assert!(result.is_match());
    validate(&person(), &set, "page").unwrap();
}

#[test]
fn unused_nested_struct_is_extra() {
    facet_temple_testhelpers::setup();

    let set = template_set(&[("page", "{{ .Name }}")]);
    let result = compare(&person(), &set, "page").unwrap();
    assert_eq!(result, comparison(&[], &["Root->Address"]));
}

#[test]
fn unknown_nested_field_is_missing_under_its_parent() {
    facet_temple_testhelpers::setup();

    let set = template_set(&[(
        "page",
        "{{ .Name }} {{ .Address.City }} {{ .Address.Zip }}",
    )]);
    let result = compare(&person(), &set, "page").unwrap();
    assert_eq!(result, comparison(&["Address->Zip"], &[]));
}

// ----------------------------------------------------------------------------
// Differ properties
// ----------------------------------------------------------------------------

#[test]
fn field_below_a_leaf_is_missing() {
    facet_temple_testhelpers::setup();

    #[derive(Facet)]
    #[allow(non_snake_case, dead_code)]
    struct Data {
        A: String,
    }

    let set = template_set(&[("t", "{{ .A.B }}")]);
    let data = Data { A: String::new() };
    assert_eq!(
        compare(&data, &set, "t").unwrap(),
        comparison(&["A->B"], &[])
    );
}

#[test]
fn unreferenced_top_level_field_is_extra() {
    facet_temple_testhelpers::setup();

    #[derive(Facet)]
    #[allow(non_snake_case, dead_code)]
    struct Data {
        X: u32,
        Y: u32,
    }

    let set = template_set(&[("t", "{{ .X }}")]);
    assert_eq!(
        compare(&Data { X: 1, Y: 2 }, &set, "t").unwrap(),
        comparison(&[], &["Root->Y"])
    );
}

#[test]
fn rebuilding_trees_is_deterministic() {
    facet_temple_testhelpers::setup();

    let set = template_set(&[(
        "page",
        indoc! {r#"
            {{ define "addr" }}{{ .City }}, {{ .Country }}{{ end }}
            {{ .Name }}{{ template "addr" .Address }}{{ if .Admin }}{{ .Role }}{{ end }}
        "#},
    )]);

    let options = CompareOptions::default();
    let first = template_tree(&set, "page", &options).unwrap();
    let second = template_tree(&set, "page", &options).unwrap();
    assert_eq!(first, second);
    assert!(diff_trees(&first, &second).is_match());

    let data_first = shape_tree(Person::SHAPE, &options);
    let data_second = shape_tree(Person::SHAPE, &options);
    assert!(diff_trees(&data_first, &data_second).is_match());
}

#[test]
fn results_are_in_lexicographic_order() {
    facet_temple_testhelpers::setup();

    #[derive(Facet)]
    #[allow(non_snake_case, dead_code)]
    struct Data {
        Zed: u8,
        Alpha: u8,
        Mid: u8,
    }

    let set = template_set(&[("t", "{{ .Qux }}{{ .Bar }}")]);
    let data = Data {
        Zed: 0,
        Alpha: 0,
        Mid: 0,
    };
    assert_eq!(
        compare(&data, &set, "t").unwrap(),
        comparison(&["Root->Bar", "Root->Qux"], &["Root->Alpha", "Root->Mid", "Root->Zed"])
    );
}

// ----------------------------------------------------------------------------
// Template inclusion
// ----------------------------------------------------------------------------

#[test]
fn inclusion_with_field_argument_narrows_scope() {
    facet_temple_testhelpers::setup();

    let paths = template_paths(
        &[
            ("main", r#"{{ template "sub" .Inner }}"#),
            ("sub", "{{ .Field }}"),
        ],
        "main",
    );
    assert_eq!(paths, ["Inner", "Inner.Field"]);
}

#[test]
fn inclusion_with_dot_or_no_argument_keeps_scope() {
    facet_temple_testhelpers::setup();

    let sub = ("sub", "{{ .Field }}");
    assert_eq!(
        template_paths(&[("main", r#"{{ template "sub" . }}"#), sub], "main"),
        ["Field"]
    );
    assert_eq!(
        template_paths(&[("main", r#"{{ template "sub" }}"#), sub], "main"),
        ["Field"]
    );
}

#[test]
fn unknown_nested_template_is_skipped() {
    facet_temple_testhelpers::setup();

    let paths = template_paths(&[("main", r#"{{ template "nope" .Arg }}{{ .Shown }}"#)], "main");
    assert_eq!(paths, ["Arg", "Shown"]);
}

#[test]
fn missing_top_level_template_is_a_configuration_error() {
    facet_temple_testhelpers::setup();

    let set = template_set(&[("page", "{{ .Name }}")]);
    let error = compare(&person(), &set, "other").unwrap_err();
    assert!(matches!(error.kind(), TempleErrorKind::TemplateNotFound(name) if name == "other"));
    assert!(error.comparison().is_none());
    assert_eq!(error.to_string(), r#"template "other" not found"#);
}

#[test]
fn block_is_walked_with_its_argument() {
    facet_temple_testhelpers::setup();

    let paths = template_paths(
        &[("main", r#"{{ block "meta" .Meta }}{{ .Author }}{{ end }}"#)],
        "main",
    );
    assert_eq!(paths, ["Meta", "Meta.Author"]);
}

#[test]
fn nested_inclusions_compose() {
    facet_temple_testhelpers::setup();

    let paths = template_paths(
        &[(
            "page",
            indoc! {r#"
                {{ define "card" }}{{ .Title }}{{ template "byline" .Author }}{{ end }}
                {{ define "byline" }}{{ .Name }}{{ end }}
                {{ template "card" .Post }}
            "#},
        )],
        "page",
    );
    assert_eq!(
        paths,
        ["Post", "Post.Author", "Post.Author.Name", "Post.Title"]
    );
}

#[test]
fn self_recursive_template_is_not_re_entered() {
    facet_temple_testhelpers::setup();

    let paths = template_paths(
        &[(
            "main",
            indoc! {r#"
                {{ define "tree" }}{{ .Label }}{{ template "tree" .Child }}{{ end }}
                {{ template "tree" . }}
            "#},
        )],
        "main",
    );
    assert_eq!(paths, ["Child", "Label"]);
}

#[test]
fn root_variable_resolves_against_the_entry_scope() {
    facet_temple_testhelpers::setup();

    let sources = [
        ("main", r#"{{ with .Ctx }}{{ $.Site.Name }}{{ end }}{{ template "sub" .Inner }}"#),
        ("sub", "{{ .Field }}{{ $.Other }}"),
    ];
    assert_eq!(
        template_paths(&sources, "main"),
        ["Inner", "Inner.Field"]
    );
    assert_eq!(
        template_paths_with(&sources, "main", &following_expressions()),
        ["Inner", "Inner.Field", "Inner.Other", "Site", "Site.Name"]
    );
}

#[test]
fn root_variable_argument_is_a_scope_only_when_following_expressions() {
    facet_temple_testhelpers::setup();

    let sources = [
        ("main", r#"{{ template "sub" $ }}"#),
        ("sub", "{{ .Name }}"),
    ];
    assert!(template_paths(&sources, "main").is_empty());
    assert_eq!(
        template_paths_with(&sources, "main", &following_expressions()),
        ["Name"]
    );
}

// ----------------------------------------------------------------------------
// Control structures
// ----------------------------------------------------------------------------

#[test]
fn if_walks_both_branches_but_not_the_condition() {
    facet_temple_testhelpers::setup();

    let paths = template_paths(
        &[(
            "t",
            "{{ if .Flag }}{{ .Then }}{{ else if .Other }}{{ .Elif }}{{ else }}{{ .Else }}{{ end }}",
        )],
        "t",
    );
    assert_eq!(paths, ["Elif", "Else", "Then"]);
}

#[test]
fn range_walks_only_its_pipeline() {
    facet_temple_testhelpers::setup();

    let paths = template_paths(
        &[(
            "t",
            "{{ range $i, $item := .Items }}{{ .Ignored }}{{ else }}{{ .AlsoIgnored }}{{ end }}",
        )],
        "t",
    );
    assert_eq!(paths, ["Items"]);
}

#[test]
fn with_walks_its_body_without_narrowing() {
    facet_temple_testhelpers::setup();

    let paths = template_paths(
        &[(
            "t",
            "{{ with .Ctx }}{{ .Inner }}{{ else }}{{ .Fallback }}{{ end }}",
        )],
        "t",
    );
    assert_eq!(paths, ["Inner"]);
}

#[test]
fn function_arguments_are_walked() {
    facet_temple_testhelpers::setup();

    let sources = [(
        "t",
        r#"{{ printf "%s: %d" .Title (len .Tags) | html }}{{ (index .Rows 0).Cell }}"#,
    )];
    assert_eq!(template_paths(&sources, "t"), ["Title"]);
    assert_eq!(
        template_paths_with(&sources, "t", &following_expressions()),
        ["Rows", "Tags", "Title"]
    );
}

#[test]
fn fields_inside_expressions_are_extra_by_default() {
    facet_temple_testhelpers::setup();

    #[derive(Facet)]
    #[facet(rename_all = "PascalCase")]
    #[allow(dead_code)]
    struct Tagged {
        tags: Vec<String>,
        name: String,
    }

    let data = Tagged {
        tags: vec!["rust".into()],
        name: "facet".into(),
    };
    let set = template_set(&[("t", r#"{{ printf "%d" (len .Tags) }}{{ $.Name }}"#)]);

    assert_eq!(
        compare(&data, &set, "t").unwrap(),
        comparison(&[], &["Root->Name", "Root->Tags"])
    );
    assert!(
        compare_with(&data, &set, "t", following_expressions())
            .unwrap()
            .is_match()
    );
}

// ----------------------------------------------------------------------------
// Options
// ----------------------------------------------------------------------------

#[test]
fn root_name_prefixes_top_level_labels() {
    facet_temple_testhelpers::setup();

    let set = template_set(&[("page", "{{ .Name }}{{ .Age }}")]);
    let options = CompareOptions::new().root_name("Person");
    assert_eq!(
        compare_with(&person(), &set, "page", options).unwrap(),
        comparison(&["Person->Age"], &["Person->Address"])
    );
}
