//! Manual serial edits: status, stickers, locations and search.

mod common;

use assert_matches::assert_matches;
use common::{TestApp, FR, IT};
use stockroom_api::{
    entities::product_serial::{STICKER_AFFIXED, STICKER_PENDING},
    errors::ServiceError,
    services::{
        master_data::CreateLocationInput,
        serials::{SerialListQuery, UpdateSerialInput},
    },
};

#[tokio::test]
async fn affixing_a_sticker_stamps_its_date() {
    let app = TestApp::new().await;
    let product = app.seed_product("Scanner", IT, 1).await;
    let serials = &app.state.services.serials;
    let serial = &serials.serials_for_product(product.product.id).await.unwrap()[0];
    assert_eq!(serial.sticker_status, STICKER_PENDING);
    assert!(serial.sticker_date.is_none());

    let updated = serials
        .update_serial(
            serial.id,
            UpdateSerialInput {
                sticker_status: Some(STICKER_AFFIXED.to_string()),
                ..Default::default()
            },
            Some("tagger@example.com"),
        )
        .await
        .unwrap();
    assert_eq!(updated.sticker_status, STICKER_AFFIXED);
    assert!(updated.sticker_date.is_some());
    assert!(updated.updated_at.is_some());

    let filtered = serials
        .list_serials(SerialListQuery {
            sticker_status: Some(STICKER_AFFIXED.to_string()),
            sticker_from: updated.sticker_date.map(|d| d.date_naive()),
            sticker_to: updated.sticker_date.map(|d| d.date_naive()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(filtered.len(), 1);
}

#[tokio::test]
async fn unknown_sticker_status_and_blank_status_are_rejected() {
    let app = TestApp::new().await;
    let product = app.seed_product("Scanner", IT, 1).await;
    let serials = &app.state.services.serials;
    let id = serials.serials_for_product(product.product.id).await.unwrap()[0].id;

    assert_matches!(
        serials
            .update_serial(
                id,
                UpdateSerialInput {
                    sticker_status: Some("lost".to_string()),
                    ..Default::default()
                },
                None,
            )
            .await,
        Err(ServiceError::ValidationError(_))
    );
    assert_matches!(
        serials
            .update_serial(
                id,
                UpdateSerialInput {
                    status: Some("  ".to_string()),
                    ..Default::default()
                },
                None,
            )
            .await,
        Err(ServiceError::ValidationError(_))
    );
}

#[tokio::test]
async fn location_can_be_assigned_and_cleared() {
    let app = TestApp::new().await;
    let product = app.seed_product("Whiteboard", FR, 2).await;
    let location = app
        .state
        .services
        .master_data
        .create_location(CreateLocationInput {
            name: "ห้องเก็บของ 2".to_string(),
            building: Some("อาคาร A".to_string()),
        })
        .await
        .unwrap();
    let serials = &app.state.services.serials;
    let id = serials.serials_for_product(product.product.id).await.unwrap()[0].id;

    let placed = serials
        .update_serial(
            id,
            UpdateSerialInput {
                location_id: Some(Some(location.id)),
                notes: Some(Some("ชั้นบน".to_string())),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();
    assert_eq!(placed.location.as_ref().unwrap().name, "ห้องเก็บของ 2");
    assert_eq!(placed.notes.as_deref(), Some("ชั้นบน"));

    let at_location = serials
        .list_serials(SerialListQuery {
            location_id: Some(location.id),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(at_location.len(), 1);

    let cleared = serials
        .update_serial(
            id,
            UpdateSerialInput {
                location_id: Some(None),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();
    assert!(cleared.location.is_none());
    assert_eq!(cleared.notes.as_deref(), Some("ชั้นบน"));

    assert_matches!(
        serials
            .update_serial(
                id,
                UpdateSerialInput {
                    location_id: Some(Some(uuid::Uuid::new_v4())),
                    ..Default::default()
                },
                None,
            )
            .await,
        Err(ServiceError::NotFound(_))
    );
}

#[tokio::test]
async fn deleting_a_location_detaches_its_serials() {
    let app = TestApp::new().await;
    let product = app.seed_product("Cabinet", FR, 1).await;
    let master = &app.state.services.master_data;
    let location = master
        .create_location(CreateLocationInput {
            name: "Store".to_string(),
            building: None,
        })
        .await
        .unwrap();
    let serials = &app.state.services.serials;
    let id = serials.serials_for_product(product.product.id).await.unwrap()[0].id;
    serials
        .update_serial(
            id,
            UpdateSerialInput {
                location_id: Some(Some(location.id)),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();

    master.delete_location(location.id).await.unwrap();

    let serial = serials.get_serial(id).await.unwrap();
    assert_eq!(serial.location_id, None);
    assert!(master.list_locations().await.unwrap().is_empty());
}

#[tokio::test]
async fn search_matches_codes_and_product_names() {
    let app = TestApp::new().await;
    app.seed_product("Laser Printer", IT, 2).await;
    app.seed_product("Desk", FR, 1).await;
    let serials = &app.state.services.serials;

    let by_code = serials
        .list_serials(SerialListQuery {
            search: Some("FR-0001".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_code.len(), 1);
    assert_eq!(by_code[0].product.as_ref().unwrap().name, "Desk");

    let by_name = serials
        .list_serials(SerialListQuery {
            search: Some("Printer".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    let codes: Vec<_> = by_name.iter().map(|s| s.serial_code.as_str()).collect();
    assert_eq!(codes, vec!["IT-0001-0001", "IT-0001-0002"]);

    serials
        .update_serial(
            by_name[0].id,
            UpdateSerialInput {
                status: Some("หาย".to_string()),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();
    let available = serials.available_serials().await.unwrap();
    assert_eq!(available.len(), 2);
    assert!(available.iter().all(|s| s.id != by_name[0].id));
}
