use refdesk_core::error::DeskError;
use refdesk_core::schema::{fold_header, Field, SchemaMap};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn headers(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|h| h.to_string()).collect()
}

// ── Tests ────────────────────────────────────────────────────────────────────

/// Case, whitespace, underscore, and hyphen variants of a known alias
/// must resolve to the same column index as the exact spelling.
#[test]
fn header_variants_resolve_like_the_exact_alias() {
    let exact = SchemaMap::resolve(&headers(&["owner name", "user id", "account balance"])).unwrap();
    let variant =
        SchemaMap::resolve(&headers(&[" OWNER_NAME ", "User-Id", "ACCOUNT  BALANCE"])).unwrap();

    for field in [Field::OwnerName, Field::UserId, Field::AccountBalance] {
        assert_eq!(
            exact.column(field),
            variant.column(field),
            "variant headers diverged for {:?}",
            field
        );
    }
}

/// Folding is separator- and case-insensitive but not fuzzy: a typo is
/// not a match.
#[test]
fn folding_is_exact_after_normalization() {
    assert_eq!(fold_header("Account_Balance"), "accountbalance");
    assert_eq!(fold_header(" ACCOUNT BALANCE "), "accountbalance");
    assert_ne!(fold_header("Acount Balance"), "accountbalance");
}

/// The first alias present wins: a sheet carrying both "user id" and
/// "id" resolves UserId to the "user id" column.
#[test]
fn alias_priority_order_is_respected() {
    let schema = SchemaMap::resolve(&headers(&["id", "owner", "user id"])).unwrap();
    assert_eq!(schema.column(Field::UserId), Some(2));
}

/// A sheet with no owner-equivalent column fails the whole ingestion
/// with the canonical field name in the error.
#[test]
fn missing_owner_column_is_rejected() {
    let err = SchemaMap::resolve(&headers(&["user id", "balance"])).unwrap_err();
    match err {
        DeskError::MissingColumn { field } => assert_eq!(field, "owner_name"),
        other => panic!("expected MissingColumn, got {other:?}"),
    }
}

/// Owner alone is not enough: at least one of user id / account number
/// must resolve.
#[test]
fn missing_both_identifier_columns_is_rejected() {
    let err = SchemaMap::resolve(&headers(&["owner", "balance", "equity"])).unwrap_err();
    assert!(
        matches!(err, DeskError::MissingColumn { .. }),
        "expected MissingColumn, got {err:?}"
    );
}

/// Either identifier column on its own satisfies the mandatory pair.
#[test]
fn account_number_alone_satisfies_the_identifier_requirement() {
    let schema = SchemaMap::resolve(&headers(&["owner", "login"])).unwrap();
    assert_eq!(schema.column(Field::AccountNumber), Some(1));
    assert_eq!(schema.column(Field::UserId), None);
}

/// Unknown columns are ignored and optional fields simply stay absent.
#[test]
fn unknown_headers_are_ignored() {
    let schema =
        SchemaMap::resolve(&headers(&["owner", "user id", "favourite colour"])).unwrap();
    assert_eq!(schema.column(Field::Email), None);
    assert_eq!(schema.column(Field::Equity), None);
}
