//! End-to-end tests for login and the guarded resource routes
//!
//! Every request goes through the real route table, the bearer middleware and
//! the policy table, against the in-memory repository.

#[macro_use]
mod common;

use actix_web::{http::StatusCode, test};
use clinic_service::db::ClinicRepository;
use clinic_service::models::{Appointment, Owner, Pet};
use clinic_service::policy::{PolicyTable, Resource};
use common::*;
use crypto_core::Role;
use serde_json::json;

fn pet_body(name: &str, owner_id: Option<i64>) -> serde_json::Value {
    json!({
        "name": name,
        "species": "cat",
        "breed": "tabby",
        "owner_id": owner_id,
        "history": "vaccinated",
    })
}

fn appointment_body(pet_id: i64, owner_id: Option<i64>) -> serde_json::Value {
    json!({
        "date": "2024-06-01",
        "time": "14:30",
        "pet_id": pet_id,
        "reason": "follow-up",
        "owner_id": owner_id,
    })
}

// =============================================================================
// Login
// =============================================================================

#[actix_web::test]
async fn test_login_then_list_only_own_pets() {
    let fx = Fixture::new().await;
    let app = app!(fx);

    let req = test::TestRequest::post()
        .uri("/login")
        .set_json(json!({ "email": "a@x.com", "password": "secret" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: serde_json::Value = test::read_body_json(resp).await;
    let token = body["token"].as_str().unwrap().to_string();

    let claims = fx.codec.validate(&token).unwrap();
    assert_eq!(claims.user_id, ALICE);
    assert_eq!(claims.role, Role::Owner);

    let req = test::TestRequest::get()
        .uri("/pets")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    let pets: Vec<Pet> = test::call_and_read_body_json(&app, req).await;

    assert_eq!(pets.len(), 2);
    assert!(pets.iter().all(|p| p.owner_id == ALICE));
}

#[actix_web::test]
async fn test_login_failures() {
    let fx = Fixture::new().await;
    let app = app!(fx);

    let wrong_password = json!({ "email": "a@x.com", "password": "nope" });
    let unknown_email = json!({ "email": "nobody@x.com", "password": "secret" });

    for body in [wrong_password, unknown_email] {
        let req = test::TestRequest::post()
            .uri("/login")
            .set_json(&body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{}", body);
    }

    let empty_password = json!({ "email": "a@x.com", "password": "" });
    let req = test::TestRequest::post()
        .uri("/login")
        .set_json(&empty_password)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/login")
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_login_accepts_any_account_identifier() {
    let fx = Fixture::new().await;
    let hash = crypto_core::hash_password("desk-pass").unwrap();
    fx.repo
        .create_user("frontdesk", &hash, Role::Staff)
        .await
        .unwrap();
    let app = app!(fx);

    let req = test::TestRequest::post()
        .uri("/login")
        .set_json(json!({ "email": "frontdesk", "password": "desk-pass" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let unknown = json!({ "email": "nobody", "password": "desk-pass" });
    let mismatch = json!({ "email": "frontdesk", "password": "wrong" });
    for body in [unknown, mismatch] {
        let req = test::TestRequest::post()
            .uri("/login")
            .set_json(&body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{}", body);
    }

    let req = test::TestRequest::post()
        .uri("/login")
        .set_json(json!({ "email": "", "password": "desk-pass" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Authentication
// =============================================================================

#[actix_web::test]
async fn test_resources_require_credential() {
    let fx = Fixture::new().await;
    let app = app!(fx);

    for uri in ["/pets", "/owners", "/appointments"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{}", uri);
    }

    let foreign = crypto_core::JwtCodec::from_secret(&"z".repeat(40))
        .unwrap()
        .issue(STAFF, Role::Staff)
        .unwrap();
    let req = test::TestRequest::get()
        .uri("/pets")
        .insert_header(("Authorization", format!("Bearer {}", foreign)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_public_routes_need_no_credential() {
    let fx = Fixture::new().await;
    let app = app!(fx);

    let req = test::TestRequest::get().uri("/health").to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "ok");

    let req = test::TestRequest::get().uri("/metrics").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

// =============================================================================
// Pets
// =============================================================================

#[actix_web::test]
async fn test_staff_lists_every_pet() {
    let fx = Fixture::new().await;
    let app = app!(fx);

    let req = test::TestRequest::get()
        .uri("/pets")
        .insert_header(("Authorization", fx.staff()))
        .to_request();
    let pets: Vec<Pet> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(pets.len(), 3);
}

#[actix_web::test]
async fn test_single_pet_read() {
    let fx = Fixture::new().await;
    let app = app!(fx);

    let cases = [
        (format!("/pets?id={}", ALICE_PET), StatusCode::OK),
        (format!("/pets?id={}", BOB_PET), StatusCode::FORBIDDEN),
        ("/pets?id=999".to_string(), StatusCode::NOT_FOUND),
        ("/pets?id=abc".to_string(), StatusCode::BAD_REQUEST),
    ];

    for (uri, expected) in cases {
        let req = test::TestRequest::get()
            .uri(&uri)
            .insert_header(("Authorization", fx.alice()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), expected, "{}", uri);
    }
}

#[actix_web::test]
async fn test_owner_created_pet_is_bound_to_caller() {
    let fx = Fixture::new().await;
    let app = app!(fx);

    let req = test::TestRequest::post()
        .uri("/pets")
        .insert_header(("Authorization", fx.alice()))
        .set_json(pet_body("Whiskers", Some(BOB)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let pet: Pet = test::read_body_json(resp).await;
    assert_eq!(pet.owner_id, ALICE);
    assert_eq!(pet.name, "Whiskers");
}

#[actix_web::test]
async fn test_staff_pet_creation_requires_owner() {
    let fx = Fixture::new().await;
    let app = app!(fx);

    let cases = [
        (pet_body("Nemo", None), StatusCode::BAD_REQUEST),
        (pet_body("Nemo", Some(77)), StatusCode::BAD_REQUEST),
        (pet_body("", Some(BOB)), StatusCode::BAD_REQUEST),
        (pet_body("Nemo", Some(BOB)), StatusCode::CREATED),
    ];

    for (body, expected) in cases {
        let req = test::TestRequest::post()
            .uri("/pets")
            .insert_header(("Authorization", fx.staff()))
            .set_json(&body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), expected, "{}", body);
    }
}

#[actix_web::test]
async fn test_owner_cannot_touch_foreign_pet() {
    let fx = Fixture::new().await;
    let app = app!(fx);

    let req = test::TestRequest::put()
        .uri(&format!("/pets?id={}", BOB_PET))
        .insert_header(("Authorization", fx.alice()))
        .set_json(pet_body("Stolen", None))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::delete()
        .uri(&format!("/pets?id={}", BOB_PET))
        .insert_header(("Authorization", fx.alice()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let untouched = fx.repo.get_pet(BOB_PET).await.unwrap().unwrap();
    assert_eq!(untouched.name, "Tom");
    assert_eq!(untouched.owner_id, BOB);
}

#[actix_web::test]
async fn test_owner_update_keeps_ownership() {
    let fx = Fixture::new().await;
    let app = app!(fx);

    let req = test::TestRequest::put()
        .uri(&format!("/pets?id={}", ALICE_PET))
        .insert_header(("Authorization", fx.alice()))
        .set_json(pet_body("Rex II", Some(BOB)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let pet: Pet = test::read_body_json(resp).await;
    assert_eq!(pet.id, ALICE_PET);
    assert_eq!(pet.name, "Rex II");
    assert_eq!(pet.species, "cat");
    assert_eq!(pet.owner_id, ALICE);
}

#[actix_web::test]
async fn test_staff_can_reassign_pet() {
    let fx = Fixture::new().await;
    let app = app!(fx);

    let req = test::TestRequest::put()
        .uri(&format!("/pets?id={}", ALICE_PET))
        .insert_header(("Authorization", fx.staff()))
        .set_json(pet_body("Rex", Some(BOB)))
        .to_request();
    let pet: Pet = test::call_and_read_body_json(&app, req).await;
    assert_eq!(pet.owner_id, BOB);
}

#[actix_web::test]
async fn test_update_requires_id() {
    let fx = Fixture::new().await;
    let app = app!(fx);

    let req = test::TestRequest::put()
        .uri("/pets")
        .insert_header(("Authorization", fx.staff()))
        .set_json(pet_body("Rex", Some(ALICE)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_repeated_delete_is_not_found() {
    let fx = Fixture::new().await;
    let app = app!(fx);

    let req = test::TestRequest::delete()
        .uri(&format!("/pets?id={}", ALICE_PET))
        .insert_header(("Authorization", fx.alice()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    for _ in 0..2 {
        let req = test::TestRequest::delete()
            .uri(&format!("/pets?id={}", ALICE_PET))
            .insert_header(("Authorization", fx.alice()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    assert!(fx.repo.get_pet(ALICE_PET).await.unwrap().is_none());
}

#[actix_web::test]
async fn test_unsupported_verb_is_method_not_allowed() {
    let fx = Fixture::new().await;
    let app = app!(fx);

    for uri in ["/pets", "/owners", "/appointments"] {
        let req = test::TestRequest::patch()
            .uri(uri)
            .insert_header(("Authorization", fx.staff()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED, "{}", uri);
    }

    let req = test::TestRequest::get().uri("/login").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}

// =============================================================================
// Owners
// =============================================================================

#[actix_web::test]
async fn test_owner_cannot_create_owner() {
    let fx = Fixture::new().await;
    let app = app!(fx);

    let body = json!({ "name": "Carol", "contact": "555-0199", "email": "c@x.com" });

    let req = test::TestRequest::post()
        .uri("/owners")
        .insert_header(("Authorization", fx.alice()))
        .set_json(&body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::post()
        .uri("/owners")
        .insert_header(("Authorization", fx.admin()))
        .set_json(&body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let owner: Owner = test::read_body_json(resp).await;
    assert_eq!(owner.name, "Carol");
    assert!(owner.id > BOB);
}

#[actix_web::test]
async fn test_role_is_checked_before_body_validation() {
    let fx = Fixture::new().await;
    let app = app!(fx);

    let bad_owner = json!({ "name": "", "contact": "555-0199", "email": "c@x.com" });
    let mut bad_appointment = appointment_body(ALICE_PET, Some(ALICE));
    bad_appointment["reason"] = json!("");

    for (uri, body) in [("/owners", &bad_owner), ("/appointments", &bad_appointment)] {
        let req = test::TestRequest::post()
            .uri(uri)
            .insert_header(("Authorization", fx.alice()))
            .set_json(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN, "{}", uri);

        let req = test::TestRequest::post()
            .uri(uri)
            .insert_header(("Authorization", fx.staff()))
            .set_json(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{}", uri);
    }
}

#[actix_web::test]
async fn test_owner_sees_only_own_record() {
    let fx = Fixture::new().await;
    let app = app!(fx);

    let req = test::TestRequest::get()
        .uri("/owners")
        .insert_header(("Authorization", fx.bob()))
        .to_request();
    let owners: Vec<Owner> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(owners.len(), 1);
    assert_eq!(owners[0].id, BOB);

    // A user without an owner record gets an empty list
    let req = test::TestRequest::get()
        .uri("/owners")
        .insert_header(("Authorization", fx.bearer(42, Role::Owner)))
        .to_request();
    let owners: Vec<Owner> = test::call_and_read_body_json(&app, req).await;
    assert!(owners.is_empty());

    let req = test::TestRequest::get()
        .uri("/owners")
        .insert_header(("Authorization", fx.staff()))
        .to_request();
    let owners: Vec<Owner> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(owners.len(), 2);
}

#[actix_web::test]
async fn test_owner_updates_only_self() {
    let fx = Fixture::new().await;
    let app = app!(fx);

    let body = json!({ "name": "Alice Smith", "contact": "555-0111", "email": "a@x.com" });

    let req = test::TestRequest::put()
        .uri(&format!("/owners?id={}", ALICE))
        .insert_header(("Authorization", fx.alice()))
        .set_json(&body)
        .to_request();
    let owner: Owner = test::call_and_read_body_json(&app, req).await;
    assert_eq!(owner.name, "Alice Smith");

    let req = test::TestRequest::put()
        .uri(&format!("/owners?id={}", BOB))
        .insert_header(("Authorization", fx.alice()))
        .set_json(&body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let bad_email = json!({ "name": "Alice", "contact": "", "email": "not-an-email" });
    let req = test::TestRequest::put()
        .uri(&format!("/owners?id={}", ALICE))
        .insert_header(("Authorization", fx.alice()))
        .set_json(&bad_email)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_owner_delete_is_staff_only() {
    let fx = Fixture::new().await;
    let app = app!(fx);

    let req = test::TestRequest::delete()
        .uri(&format!("/owners?id={}", ALICE))
        .insert_header(("Authorization", fx.alice()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::delete()
        .uri(&format!("/owners?id={}", ALICE))
        .insert_header(("Authorization", fx.staff()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    assert!(fx.repo.list_pets_by_owner(ALICE).await.unwrap().is_empty());
}

// =============================================================================
// Appointments
// =============================================================================

#[actix_web::test]
async fn test_owner_lists_own_appointments() {
    let fx = Fixture::new().await;
    let app = app!(fx);

    let req = test::TestRequest::get()
        .uri("/appointments")
        .insert_header(("Authorization", fx.bob()))
        .to_request();
    let appointments: Vec<Appointment> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(appointments.len(), 1);
    assert_eq!(appointments[0].id, BOB_APPOINTMENT);
    assert_eq!(appointments[0].date.to_string(), "2024-05-01");
}

#[actix_web::test]
async fn test_update_missing_appointment_is_not_found() {
    let fx = Fixture::new().await;
    let app = app!(fx);

    let req = test::TestRequest::put()
        .uri("/appointments?id=999")
        .insert_header(("Authorization", fx.staff()))
        .set_json(appointment_body(ALICE_PET, Some(ALICE)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_appointment_booking_is_staff_only() {
    let fx = Fixture::new().await;
    let app = app!(fx);

    let req = test::TestRequest::post()
        .uri("/appointments")
        .insert_header(("Authorization", fx.alice()))
        .set_json(appointment_body(ALICE_PET, Some(ALICE)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // Pet must belong to the appointment's owner
    let req = test::TestRequest::post()
        .uri("/appointments")
        .insert_header(("Authorization", fx.staff()))
        .set_json(appointment_body(BOB_PET, Some(ALICE)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/appointments")
        .insert_header(("Authorization", fx.staff()))
        .set_json(appointment_body(ALICE_PET, Some(ALICE)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let appointment: Appointment = test::read_body_json(resp).await;
    assert_eq!(appointment.owner_id, ALICE);
    assert_eq!(appointment.time, "14:30");
}

#[actix_web::test]
async fn test_owner_reschedules_only_own_appointment() {
    let fx = Fixture::new().await;
    let app = app!(fx);

    let req = test::TestRequest::put()
        .uri(&format!("/appointments?id={}", ALICE_APPOINTMENT))
        .insert_header(("Authorization", fx.alice()))
        .set_json(appointment_body(ALICE_PET, None))
        .to_request();
    let appointment: Appointment = test::call_and_read_body_json(&app, req).await;
    assert_eq!(appointment.owner_id, ALICE);
    assert_eq!(appointment.reason, "follow-up");

    let req = test::TestRequest::put()
        .uri(&format!("/appointments?id={}", BOB_APPOINTMENT))
        .insert_header(("Authorization", fx.alice()))
        .set_json(appointment_body(ALICE_PET, None))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::delete()
        .uri(&format!("/appointments?id={}", BOB_APPOINTMENT))
        .insert_header(("Authorization", fx.alice()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn test_narrowed_route_denies_owner_role() {
    let policy = PolicyTable::default().with_roles(Resource::Appointment, &[Role::Staff, Role::Admin]);
    let fx = Fixture::with_policy(policy).await;
    let app = app!(fx);

    let req = test::TestRequest::get()
        .uri("/appointments")
        .insert_header(("Authorization", fx.alice()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::get()
        .uri("/appointments")
        .insert_header(("Authorization", fx.admin()))
        .to_request();
    let appointments: Vec<Appointment> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(appointments.len(), 2);
}
