//! Column lists derived from model schemas, as seen through the facade.

use std::collections::HashMap;

use pretty_assertions::assert_eq;
use strata::prelude::*;
use strata::query::model;

struct Account;

impl Schema for Account {
    fn fields() -> Vec<Field> {
        vec![Field::column("id")]
    }
}

impl Model for Account {
    fn model_name() -> &'static str {
        "model"
    }
}

struct Timestamps;

impl Schema for Timestamps {
    fn fields() -> Vec<Field> {
        vec![Field::column("created_at")]
    }
}

struct Video;

impl Schema for Video {
    fn fields() -> Vec<Field> {
        vec![
            Field::column("id"),
            Field::column("title"),
            Field::embedded::<Timestamps>(),
        ]
    }
}

impl Model for Video {
    fn model_name() -> &'static str {
        "video"
    }
}

struct VideoWithOwner;

impl Schema for VideoWithOwner {
    fn fields() -> Vec<Field> {
        vec![
            Field::nested::<Video>("video"),
            Field::nested::<Account>("owner"),
        ]
    }
}

#[test]
fn test_single_column_model() {
    assert_eq!(model::columns::<Account>(&[]), vec!["id"]);
    assert_eq!(model::column_full::<Account>("id"), "model.id");
    assert_eq!(model::model_name::<Account>(), "model");
}

#[test]
fn test_select_list_for_joined_rows() {
    let overrides = HashMap::from([(
        "video.title".to_string(),
        r#"COALESCE("video"."title", '') AS "video.title""#.to_string(),
    )]);
    let select = model::join(&model::extract::<VideoWithOwner>(Some(&overrides)));
    assert_eq!(
        select,
        [
            r#""video"."id" AS "video.id""#,
            r#"COALESCE("video"."title", '') AS "video.title""#,
            r#""video"."created_at" AS "video.created_at""#,
            r#""owner"."id" AS "owner.id""#,
        ]
        .join(",\n\t")
    );
}

#[test]
fn test_embedded_columns_belong_to_parent() {
    assert_eq!(
        model::columns_full::<Video>(&[]),
        vec!["video.id", "video.title", "video.created_at"]
    );
    assert_eq!(model::column::<Video>("created_at"), "created_at");
}
