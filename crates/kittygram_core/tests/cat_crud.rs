use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use kittygram_core::db::open_db_in_memory;
use kittygram_core::model::cat::{Cat, CatFields, CatId, NewCat, NO_COLOR_DATA};
use kittygram_core::repo::cat_repo::{CatListQuery, CatRepository, SqliteCatRepository};
use kittygram_core::repo::user_repo::{SqliteUserRepository, UserRepository};
use kittygram_core::service::cat_service::upload_image;
use kittygram_core::transcode::color::MSG_UNKNOWN_COLOR;
use kittygram_core::transcode::image::MSG_NOT_A_FILE;
use kittygram_core::validation::{MSG_REQUIRED, MSG_TOO_OLD};
use kittygram_core::{
    CatPayload, CatService, CatServiceError, FixedClock, MediaStore, RepoError, RepoResult,
    RequestContext, UpdateMode, UserId, ValidationErrors,
};
use rusqlite::Connection;
use serde_json::json;
use tempfile::TempDir;

const CURRENT_YEAR: i32 = 2024;
const PIXEL_PNG: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

struct Fixture {
    conn: Connection,
    media_dir: TempDir,
    media: MediaStore,
    clock: FixedClock,
    owner: UserId,
}

impl Fixture {
    fn new() -> Self {
        let conn = open_db_in_memory().unwrap();
        let owner = SqliteUserRepository::try_new(&conn)
            .unwrap()
            .create_user("alice")
            .unwrap()
            .id;
        let media_dir = tempfile::tempdir().unwrap();
        let media = MediaStore::new(media_dir.path());
        Self {
            conn,
            media_dir,
            media,
            clock: FixedClock(CURRENT_YEAR),
            owner,
        }
    }

    fn ctx(&self) -> RequestContext {
        RequestContext::for_user(self.owner)
    }

    fn service(&mut self) -> CatService<'_, SqliteCatRepository<'_>> {
        let repo = SqliteCatRepository::try_new(&mut self.conn).unwrap();
        CatService::new(repo, &self.media, &self.clock)
    }

    fn create(&mut self, body: serde_json::Value) -> kittygram_core::CatView {
        let ctx = self.ctx();
        self.service().create_cat(&ctx, payload(body)).unwrap()
    }

    fn count(&self, table: &str) -> i64 {
        self.conn
            .query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
                row.get(0)
            })
            .unwrap()
    }
}

fn payload(body: serde_json::Value) -> CatPayload {
    serde_json::from_value(body).unwrap()
}

fn validation_errors(err: CatServiceError) -> ValidationErrors {
    match err {
        CatServiceError::Validation(errors) => errors,
        other => panic!("expected validation error, got {other}"),
    }
}

fn achievement_names(view: &kittygram_core::CatView) -> Vec<&str> {
    view.achievements.iter().map(|a| a.name.as_str()).collect()
}

#[test]
fn create_converts_hex_color_and_derives_age() {
    let mut fx = Fixture::new();
    let cat = fx.create(json!({"name": "Tom", "color": "#FF0000", "birth_year": 2020}));

    assert_eq!(cat.name, "Tom");
    assert_eq!(cat.color, "red");
    assert_eq!(cat.birth_year, 2020);
    assert_eq!(cat.age, 4);
    assert_eq!(cat.owner, fx.owner);
    assert!(cat.achievements.is_empty());
    assert_eq!(cat.image, None);
}

#[test]
fn create_ignores_read_only_fields() {
    let mut fx = Fixture::new();
    let cat = fx.create(json!({
        "id": 99, "owner": 77, "age": 1,
        "name": "Tom", "color": "#000", "birth_year": 2020
    }));
    assert_ne!(cat.id, 99);
    assert_eq!(cat.owner, fx.owner);
    assert_eq!(cat.age, 4);
    assert_eq!(cat.color, "black");
}

#[test]
fn aliased_hex_values_resolve_to_one_name() {
    let mut fx = Fixture::new();
    let gray = fx.create(json!({"name": "Smoke", "color": "#808080", "birth_year": 2020}));
    let cyan = fx.create(json!({"name": "Sky", "color": "#00ffff", "birth_year": 2020}));
    assert_eq!(gray.color, "gray");
    assert_eq!(cyan.color, "cyan");
}

#[test]
fn birth_year_allows_exactly_thirty_years() {
    let mut fx = Fixture::new();
    let oldest = fx.create(json!({"name": "Elder", "color": "#ffffff", "birth_year": 1994}));
    assert_eq!(oldest.age, 30);

    let ctx = fx.ctx();
    let err = fx
        .service()
        .create_cat(
            &ctx,
            payload(json!({"name": "Ancient", "color": "#ffffff", "birth_year": 1993})),
        )
        .unwrap_err();
    let errors = validation_errors(err);
    assert_eq!(errors.messages("birth_year").to_vec(), vec![MSG_TOO_OLD]);
    assert_eq!(fx.count("cats"), 1);
}

#[test]
fn extreme_birth_year_is_a_validation_error() {
    let mut fx = Fixture::new();
    let ctx = fx.ctx();
    let err = fx
        .service()
        .create_cat(
            &ctx,
            payload(json!({"name": "Ancient", "color": "#ffffff", "birth_year": i32::MIN})),
        )
        .unwrap_err();
    let errors = validation_errors(err);
    assert_eq!(errors.messages("birth_year").to_vec(), vec![MSG_TOO_OLD]);
    assert_eq!(fx.count("cats"), 0);
}

#[test]
fn rejected_payload_writes_nothing() {
    let mut fx = Fixture::new();
    let ctx = fx.ctx();
    let err = fx
        .service()
        .create_cat(
            &ctx,
            payload(json!({
                "name": "Tom",
                "color": "#663399",
                "birth_year": 2020,
                "achievements": [{"achievement_name": "Mouser"}]
            })),
        )
        .unwrap_err();

    let errors = validation_errors(err);
    assert_eq!(errors.messages("color").to_vec(), vec![MSG_UNKNOWN_COLOR]);
    assert_eq!(fx.count("cats"), 0);
    assert_eq!(fx.count("achievements"), 0);
    assert_eq!(fx.count("cat_achievements"), 0);
}

#[test]
fn create_reports_every_missing_field() {
    let mut fx = Fixture::new();
    let ctx = fx.ctx();
    let err = fx
        .service()
        .create_cat(&ctx, payload(json!({})))
        .unwrap_err();
    let errors = validation_errors(err);
    for field in ["name", "color", "birth_year"] {
        assert_eq!(errors.messages(field).to_vec(), vec![MSG_REQUIRED], "{field}");
    }
}

#[test]
fn anonymous_caller_cannot_create() {
    let mut fx = Fixture::new();
    let err = fx
        .service()
        .create_cat(
            &RequestContext::anonymous(),
            payload(json!({"name": "Tom", "color": "#ff0000", "birth_year": 2020})),
        )
        .unwrap_err();
    assert!(matches!(err, CatServiceError::Unauthenticated));
    assert_eq!(fx.count("cats"), 0);
}

#[test]
fn nested_achievements_are_shared_by_name() {
    let mut fx = Fixture::new();
    let first = fx.create(json!({
        "name": "Tom", "color": "#ff0000", "birth_year": 2020,
        "achievements": [{"achievement_name": "Mouser"}]
    }));
    let second = fx.create(json!({
        "name": "Felix", "color": "#0000ff", "birth_year": 2021,
        "achievements": [
            {"achievement_name": "Mouser"},
            {"achievement_name": "Napper"},
            {"achievement_name": "Napper"}
        ]
    }));

    assert_eq!(achievement_names(&second), vec!["Mouser", "Napper"]);
    assert_eq!(first.achievements[0].id, second.achievements[0].id);
    assert_eq!(fx.count("achievements"), 2);
    assert_eq!(fx.count("cat_achievements"), 3);
}

#[test]
fn update_with_achievements_replaces_the_link_set() {
    let mut fx = Fixture::new();
    let cat = fx.create(json!({
        "name": "Tom", "color": "#ff0000", "birth_year": 2020,
        "achievements": [{"achievement_name": "A"}, {"achievement_name": "B"}]
    }));

    let updated = fx
        .service()
        .update_cat(
            cat.id,
            payload(json!({"achievements": [{"achievement_name": "B"}, {"achievement_name": "C"}]})),
            UpdateMode::Partial,
        )
        .unwrap();

    assert_eq!(achievement_names(&updated), vec!["B", "C"]);
    assert_eq!(fx.count("achievements"), 3);
    assert_eq!(fx.count("cat_achievements"), 2);

    let cleared = fx
        .service()
        .update_cat(cat.id, payload(json!({"achievements": []})), UpdateMode::Partial)
        .unwrap();
    assert!(cleared.achievements.is_empty());
    assert_eq!(fx.count("achievements"), 3);
}

#[test]
fn partial_update_keeps_absent_fields_and_links() {
    let mut fx = Fixture::new();
    let cat = fx.create(json!({
        "name": "Tom", "color": "#ff0000", "birth_year": 2020,
        "achievements": [{"achievement_name": "Mouser"}]
    }));

    let updated = fx
        .service()
        .update_cat(cat.id, payload(json!({"name": "Thomas"})), UpdateMode::Partial)
        .unwrap();

    assert_eq!(updated.name, "Thomas");
    assert_eq!(updated.color, "red");
    assert_eq!(updated.birth_year, 2020);
    assert_eq!(achievement_names(&updated), vec!["Mouser"]);
}

#[test]
fn full_update_requires_writable_fields() {
    let mut fx = Fixture::new();
    let cat = fx.create(json!({"name": "Tom", "color": "#ff0000", "birth_year": 2020}));

    let err = fx
        .service()
        .update_cat(cat.id, payload(json!({"name": "Thomas"})), UpdateMode::Full)
        .unwrap_err();
    let errors = validation_errors(err);
    assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["birth_year", "color"]);

    let unchanged = fx.service().get_cat(cat.id).unwrap();
    assert_eq!(unchanged.name, "Tom");

    let replaced = fx
        .service()
        .update_cat(
            cat.id,
            payload(json!({"name": "Thomas", "color": "#008000", "birth_year": 2019})),
            UpdateMode::Full,
        )
        .unwrap();
    assert_eq!(replaced.color, "green");
    assert_eq!(replaced.age, 5);
}

#[test]
fn updating_missing_cat_is_not_found() {
    let mut fx = Fixture::new();
    let err = fx
        .service()
        .update_cat(404, payload(json!({"name": "Ghost"})), UpdateMode::Partial)
        .unwrap_err();
    assert!(matches!(err, CatServiceError::CatNotFound(404)));
}

#[test]
fn embedded_image_is_stored_and_rendered_back() {
    let mut fx = Fixture::new();
    let data_uri = format!("data:image/png;base64,{PIXEL_PNG}");
    let cat = fx.create(json!({
        "name": "Tom", "color": "#ff0000", "birth_year": 2020, "image": data_uri
    }));

    assert_eq!(cat.image.as_deref(), Some(data_uri.as_str()));
    assert!(fx.media_dir.path().join("cats/images/temp.png").is_file());

    let cleared = fx
        .service()
        .update_cat(cat.id, payload(json!({"image": null})), UpdateMode::Partial)
        .unwrap();
    assert_eq!(cleared.image, None);
}

#[test]
fn update_replaces_image_with_new_content() {
    let mut fx = Fixture::new();
    let cat = fx.create(json!({
        "name": "Tom", "color": "#ff0000", "birth_year": 2020,
        "image": format!("data:image/png;base64,{PIXEL_PNG}")
    }));

    let gif = b"GIF89a\x01\x00\x01\x00\x00\x00\x00".to_vec();
    let gif_uri = format!("data:image/gif;base64,{}", STANDARD.encode(&gif));
    let updated = fx
        .service()
        .update_cat(cat.id, payload(json!({"image": gif_uri})), UpdateMode::Partial)
        .unwrap();

    let image = updated.image.unwrap();
    let encoded = image.strip_prefix("data:image/gif;base64,").unwrap();
    assert_eq!(STANDARD.decode(encoded).unwrap(), gif);
    assert_eq!(fx.service().get_cat(cat.id).unwrap().image, Some(image));
}

#[test]
fn raw_upload_is_accepted() {
    let mut fx = Fixture::new();
    let mut body = payload(json!({"name": "Tom", "color": "#ff0000", "birth_year": 2020}));
    body.image = Some(Some(upload_image(
        "whiskers.gif",
        b"GIF89a\x01\x00\x01\x00\x00\x00\x00".to_vec(),
    )));
    let ctx = fx.ctx();
    let cat = fx.service().create_cat(&ctx, body).unwrap();

    let image = cat.image.unwrap();
    assert!(image.starts_with("data:image/gif;base64,"));
    assert!(fx.media_dir.path().join("cats/images/whiskers.gif").is_file());
}

#[test]
fn non_image_string_is_rejected() {
    let mut fx = Fixture::new();
    let ctx = fx.ctx();
    let err = fx
        .service()
        .create_cat(
            &ctx,
            payload(json!({
                "name": "Tom", "color": "#ff0000", "birth_year": 2020,
                "image": "https://example.com/cat.png"
            })),
        )
        .unwrap_err();
    let errors = validation_errors(err);
    assert_eq!(errors.messages("image").to_vec(), vec![MSG_NOT_A_FILE]);
}

#[test]
fn top_color_reports_placeholder_then_most_frequent() {
    let mut fx = Fixture::new();
    let empty = fx.service().top_color().unwrap();
    assert_eq!(empty.message(), NO_COLOR_DATA);
    assert_eq!(
        serde_json::to_value(&empty).unwrap(),
        json!({"Самый популярный цвет": NO_COLOR_DATA})
    );

    for color in ["#ff0000", "#ff0000", "#0000ff"] {
        fx.create(json!({"name": "Tom", "color": color, "birth_year": 2020}));
    }
    let top = fx.service().top_color().unwrap();
    assert_eq!(
        serde_json::to_value(&top).unwrap(),
        json!({"Самый популярный цвет": "red"})
    );
}

#[test]
fn top_color_ties_break_alphabetically() {
    let mut fx = Fixture::new();
    for color in ["#ff0000", "#0000ff"] {
        fx.create(json!({"name": "Tom", "color": color, "birth_year": 2020}));
    }
    assert_eq!(fx.service().top_color().unwrap().message(), "blue");
}

#[test]
fn list_applies_window_in_id_order() {
    let mut fx = Fixture::new();
    let ids = ["One", "Two", "Three"]
        .into_iter()
        .map(|name| fx.create(json!({"name": name, "color": "#ff0000", "birth_year": 2020})).id)
        .collect::<Vec<_>>();

    let page = fx.service().list_cats(Some(2), 1).unwrap();
    assert_eq!(
        page.iter().map(|cat| cat.id).collect::<Vec<_>>(),
        ids[1..].to_vec()
    );

    let defaults = fx.service().list_cats(None, 0).unwrap();
    assert_eq!(defaults.len(), 3);
    assert!(fx.service().list_cats(Some(2), 3).unwrap().is_empty());
}

#[test]
fn delete_removes_links_but_keeps_achievements() {
    let mut fx = Fixture::new();
    let cat = fx.create(json!({
        "name": "Tom", "color": "#ff0000", "birth_year": 2020,
        "achievements": [{"achievement_name": "Mouser"}]
    }));

    fx.service().delete_cat(cat.id).unwrap();
    assert_eq!(fx.count("cat_achievements"), 0);
    assert_eq!(fx.count("achievements"), 1);

    assert!(matches!(
        fx.service().get_cat(cat.id),
        Err(CatServiceError::CatNotFound(_))
    ));
    assert!(matches!(
        fx.service().delete_cat(cat.id),
        Err(CatServiceError::CatNotFound(_))
    ));
}

/// Reads succeed but every write fails, as a rolled-back transaction would.
struct FailingWrites {
    stored: Cat,
}

impl CatRepository for FailingWrites {
    fn create_cat(&mut self, _cat: &NewCat, _achievements: &[String]) -> RepoResult<CatId> {
        Err(RepoError::InvalidData("write rejected".to_string()))
    }

    fn update_cat(
        &mut self,
        _id: CatId,
        _fields: &CatFields,
        _achievements: Option<&[String]>,
    ) -> RepoResult<()> {
        Err(RepoError::InvalidData("write rejected".to_string()))
    }

    fn get_cat(&self, id: CatId) -> RepoResult<Option<Cat>> {
        Ok((id == self.stored.id).then(|| self.stored.clone()))
    }

    fn list_cats(&self, _query: &CatListQuery) -> RepoResult<Vec<Cat>> {
        Ok(vec![self.stored.clone()])
    }

    fn delete_cat(&self, _id: CatId) -> RepoResult<()> {
        Ok(())
    }

    fn most_common_color(&self) -> RepoResult<Option<String>> {
        Ok(Some(self.stored.color.clone()))
    }
}

#[test]
fn failed_write_discards_the_saved_image() {
    let fx = Fixture::new();
    let repo = FailingWrites {
        stored: Cat {
            id: 1,
            name: "Tom".to_string(),
            color: "red".to_string(),
            birth_year: 2020,
            image: None,
            owner: fx.owner,
            achievements: Vec::new(),
        },
    };
    let mut service = CatService::new(repo, &fx.media, &fx.clock);
    let images = fx.media_dir.path().join("cats/images");
    let stored_images = || std::fs::read_dir(&images).unwrap().count();
    let with_image = || {
        payload(json!({
            "name": "Tom", "color": "#ff0000", "birth_year": 2020,
            "image": format!("data:image/png;base64,{PIXEL_PNG}")
        }))
    };

    assert!(service.create_cat(&fx.ctx(), with_image()).is_err());
    assert_eq!(stored_images(), 0);

    assert!(service.update_cat(1, with_image(), UpdateMode::Full).is_err());
    assert_eq!(stored_images(), 0);
}
