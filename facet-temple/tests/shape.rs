use std::sync::Arc;

use facet::Facet;
use facet_temple::{CompareOptions, compare, shape_tree};
use facet_temple_testhelpers::template_set;

fn paths<'f, T: Facet<'f>>() -> Vec<String> {
    shape_tree(T::SHAPE, &CompareOptions::default()).paths()
}

#[derive(Facet)]
#[facet(rename_all = "PascalCase")]
#[allow(dead_code)]
struct Address {
    street: String,
    city: String,
}

// ----------------------------------------------------------------------------
// Structure
// ----------------------------------------------------------------------------

#[test]
fn fields_follow_declared_names() {
    facet_temple_testhelpers::setup();

    #[derive(Facet)]
    #[allow(dead_code)]
    struct Plain {
        first_name: String,
        #[facet(rename = "URL")]
        url: String,
    }

    assert_eq!(paths::<Plain>(), ["URL", "first_name"]);
}

#[test]
fn nested_structs_are_recursed_into() {
    facet_temple_testhelpers::setup();

    #[derive(Facet)]
    #[facet(rename_all = "PascalCase")]
    #[allow(dead_code)]
    struct Customer {
        name: String,
        home: Address,
    }

    assert_eq!(
        paths::<Customer>(),
        ["Home", "Home.City", "Home.Street", "Name"]
    );
}

#[test]
fn wrappers_are_looked_through() {
    facet_temple_testhelpers::setup();

    #[derive(Facet)]
    #[facet(rename_all = "PascalCase")]
    #[allow(dead_code)]
    struct Wrapped {
        maybe: Option<Address>,
        boxed: Box<Address>,
        shared: Option<Arc<Address>>,
    }

    assert_eq!(
        paths::<Wrapped>(),
        [
            "Boxed",
            "Boxed.City",
            "Boxed.Street",
            "Maybe",
            "Maybe.City",
            "Maybe.Street",
            "Shared",
            "Shared.City",
            "Shared.Street",
        ]
    );
    assert_eq!(paths::<Option<Box<Address>>>(), ["City", "Street"]);
}

#[test]
fn collections_and_scalars_are_leaves() {
    facet_temple_testhelpers::setup();

    #[derive(Facet)]
    #[facet(rename_all = "PascalCase")]
    #[allow(dead_code)]
    struct Listing {
        items: Vec<Address>,
        count: u32,
        tags: Vec<String>,
    }

    assert_eq!(paths::<Listing>(), ["Count", "Items", "Tags"]);
    assert!(paths::<String>().is_empty());
    assert!(paths::<Vec<Address>>().is_empty());
}

#[test]
fn tuple_structs_have_no_named_fields() {
    facet_temple_testhelpers::setup();

    #[derive(Facet)]
    #[allow(dead_code)]
    struct Pair(u32, u32);

    assert!(paths::<Pair>().is_empty());
}

#[test]
fn flattened_fields_merge_into_the_parent() {
    facet_temple_testhelpers::setup();

    #[derive(Facet)]
    #[facet(rename_all = "PascalCase")]
    #[allow(dead_code)]
    struct Meta {
        author: String,
        published: bool,
    }

    #[derive(Facet)]
    #[facet(rename_all = "PascalCase")]
    #[allow(dead_code)]
    struct Article {
        title: String,
        #[facet(flatten)]
        meta: Meta,
    }

    assert_eq!(paths::<Article>(), ["Author", "Published", "Title"]);
}

#[test]
fn recursive_types_stop_at_the_repeated_type() {
    facet_temple_testhelpers::setup();

    #[derive(Facet)]
    #[facet(rename_all = "PascalCase")]
    #[allow(dead_code)]
    struct Category {
        name: String,
        #[facet(recursive_type)]
        parent: Option<Box<Category>>,
    }

    assert_eq!(paths::<Category>(), ["Name", "Parent"]);
}

// ----------------------------------------------------------------------------
// Hidden fields
// ----------------------------------------------------------------------------

#[derive(Facet)]
#[facet(rename_all = "PascalCase")]
#[allow(dead_code)]
struct Account {
    login: String,
    #[facet(sensitive)]
    password: String,
    #[facet(skip)]
    cache: String,
    #[facet(skip_serializing)]
    internal_id: u64,
}

fn account() -> Account {
    Account {
        login: "ada".into(),
        password: "hunter2".into(),
        cache: String::new(),
        internal_id: 7,
    }
}

#[test]
fn hidden_fields_are_not_part_of_the_contract() {
    facet_temple_testhelpers::setup();

    assert_eq!(paths::<Account>(), ["Login"]);

    let set = template_set(&[("account", "{{ .Login }}")]);
    let result = compare(&account(), &set, "account").unwrap();
    assert!(result.is_match(), "{result:?}");
}

#[test]
fn hidden_fields_used_by_the_template_are_missing() {
    facet_temple_testhelpers::setup();

    let set = template_set(&[("account", "{{ .Login }}{{ .Password }}")]);
    let result = compare(&account(), &set, "account").unwrap();
    assert_eq!(result.missing, ["Root->Password"]);
    assert!(result.extra.is_empty());
}

#[test]
fn sensitive_fields_can_be_exposed() {
    facet_temple_testhelpers::setup();

    let options = CompareOptions::new().hide_sensitive(false);
    assert_eq!(
        shape_tree(Account::SHAPE, &options).paths(),
        ["Login", "Password"]
    );
}
