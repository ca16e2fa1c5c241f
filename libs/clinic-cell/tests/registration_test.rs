use std::sync::Arc;

use assert_matches::assert_matches;
use uuid::Uuid;

use clinic_cell::*;
use shared_models::auth::Role;
use shared_utils::guard::Actor;
use shared_utils::test_utils::TestUser;

const SEEDED_CODE: &str = "CLINIC-1700000000-ABCDEFGHI";

struct Fixture {
    store: Arc<InMemoryClinicStore>,
    service: Arc<RegistrationService>,
    admin: Actor,
}

impl Fixture {
    fn new() -> Self {
        let store = Arc::new(InMemoryClinicStore::new());
        let service = Arc::new(RegistrationService::new(store.clone()).unwrap());
        Self {
            store,
            service,
            admin: TestUser::admin("ops@ncbs.gov.za").to_actor(None),
        }
    }

    async fn seed_clinic(&self, email: Option<&str>) -> Clinic {
        let clinic = Clinic {
            id: Uuid::new_v4(),
            name: "Alexandra Health Centre".to_string(),
            province: Some("Gauteng".to_string()),
            city: Some("Johannesburg".to_string()),
            address: None,
            phone: None,
            email: email.map(str::to_string),
            registration_code: Some(SEEDED_CODE.to_string()),
            code_used: false,
            admin_user_id: None,
            created_at: None,
            updated_at: None,
        };
        self.store.insert(clinic.clone()).await;
        clinic
    }

    async fn stored(&self, id: Uuid) -> Clinic {
        self.store.get(id).await.unwrap().expect("clinic exists")
    }
}

fn registrant(email: &str) -> Registrant {
    Registrant {
        user_id: Uuid::new_v4(),
        email: email.to_string(),
        full_name: Some("Nomsa Dube".to_string()),
    }
}

#[tokio::test]
async fn code_redeems_once() {
    let f = Fixture::new();
    let clinic = f.seed_clinic(Some("info@alexhealth.org.za")).await;
    let first = registrant("nomsa@alexhealth.org.za");

    let redemption = f
        .service
        .redeem_code(clinic.id, SEEDED_CODE, &first, RedeemOptions::default())
        .await
        .unwrap();

    assert_eq!(redemption.admin_user_id, first.user_id);
    let stored = f.stored(clinic.id).await;
    assert!(stored.code_used);
    assert_eq!(stored.admin_user_id, Some(first.user_id));
    assert_eq!(
        f.store.grant_for(first.user_id).await,
        Some(RoleGrant { role: Role::ClinicAdmin, clinic_id: clinic.id })
    );

    let second = registrant("thabo@alexhealth.org.za");
    assert_matches!(
        f.service.redeem_code(clinic.id, SEEDED_CODE, &second, RedeemOptions::default()).await,
        Err(ClinicError::CodeAlreadyUsed)
    );
    assert_eq!(f.store.grant_for(second.user_id).await, None);
}

#[tokio::test]
async fn concurrent_redemptions_have_one_winner() {
    let f = Fixture::new();
    let clinic = f.seed_clinic(Some("info@alexhealth.org.za")).await;

    let attempts = (0..8).map(|i| {
        let service = f.service.clone();
        let who = registrant(&format!("admin{}@alexhealth.org.za", i));
        tokio::spawn(async move {
            service
                .redeem_code(clinic.id, SEEDED_CODE, &who, RedeemOptions::default())
                .await
        })
    });
    let results: Vec<_> = futures::future::join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    for lost in results.iter().filter(|r| r.is_err()) {
        assert_matches!(lost, Err(ClinicError::CodeAlreadyUsed));
    }
}

#[tokio::test]
async fn reissued_code_replaces_the_old_one() {
    let f = Fixture::new();
    let clinic = f.seed_clinic(None).await;

    let fresh = f.service.issue_code(&f.admin, clinic.id).await.unwrap();
    assert_ne!(fresh, SEEDED_CODE);
    assert!(fresh.starts_with("CLINIC-"));

    let who = registrant("nomsa@gmail.com");
    assert_matches!(
        f.service.redeem_code(clinic.id, SEEDED_CODE, &who, RedeemOptions::default()).await,
        Err(ClinicError::CodeMismatch)
    );

    f.service
        .redeem_code(clinic.id, &fresh, &who, RedeemOptions::default())
        .await
        .unwrap();
}

#[tokio::test]
async fn redeemed_code_cannot_be_reissued() {
    let f = Fixture::new();
    let clinic = f.seed_clinic(None).await;
    f.service
        .redeem_code(clinic.id, SEEDED_CODE, &registrant("nomsa@example.com"), RedeemOptions::default())
        .await
        .unwrap();

    assert_matches!(
        f.service.issue_code(&f.admin, clinic.id).await,
        Err(ClinicError::CodeAlreadyUsed)
    );
    assert_eq!(f.stored(clinic.id).await.registration_code.as_deref(), Some(SEEDED_CODE));
}

#[tokio::test]
async fn only_admins_issue_codes() {
    let f = Fixture::new();
    let clinic = f.seed_clinic(None).await;
    let clinic_admin = Actor::clinic_admin(Uuid::new_v4(), clinic.id);

    assert_matches!(
        f.service.issue_code(&clinic_admin, clinic.id).await,
        Err(ClinicError::Forbidden(_))
    );
    assert_matches!(
        f.service.issue_code(&f.admin, Uuid::new_v4()).await,
        Err(ClinicError::ClinicNotFound(_))
    );
}

#[tokio::test]
async fn typed_code_is_normalised() {
    let f = Fixture::new();
    let clinic = f.seed_clinic(None).await;

    f.service
        .redeem_code(
            clinic.id,
            "  clinic-1700000000-abcdefghi ",
            &registrant("nomsa@example.com"),
            RedeemOptions::default(),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn errors_follow_check_order() {
    let f = Fixture::new();
    let who = registrant("nomsa@gmail.com");

    assert_matches!(
        f.service.redeem_code(Uuid::new_v4(), SEEDED_CODE, &who, RedeemOptions::default()).await,
        Err(ClinicError::ClinicNotFound(_))
    );

    let clinic = f.seed_clinic(Some("info@alexhealth.org.za")).await;
    // Wrong code is reported before the mismatched domain.
    assert_matches!(
        f.service.redeem_code(clinic.id, "CLINIC-1-WRONG", &who, RedeemOptions::default()).await,
        Err(ClinicError::CodeMismatch)
    );
}

#[tokio::test]
async fn personal_mailbox_is_rejected_when_clinic_has_email() {
    let f = Fixture::new();
    let clinic = f.seed_clinic(Some("info@alexhealth.org.za")).await;

    let err = f
        .service
        .redeem_code(clinic.id, SEEDED_CODE, &registrant("nomsa@gmail.com"), RedeemOptions::default())
        .await
        .unwrap_err();

    assert_eq!(err, ClinicError::EmailDomainMismatch { expected: "alexhealth.org.za".to_string() });
    assert!(!f.stored(clinic.id).await.code_used);
}

#[tokio::test]
async fn healthcare_looking_domains_pass() {
    let f = Fixture::new();
    let clinic = f.seed_clinic(Some("info@alexhealth.org.za")).await;

    f.service
        .redeem_code(clinic.id, SEEDED_CODE, &registrant("admin@sowetohospital.co.za"), RedeemOptions::default())
        .await
        .unwrap();
}

#[tokio::test]
async fn admin_can_override_domain_check() {
    let f = Fixture::new();
    let clinic = f.seed_clinic(Some("info@alexhealth.org.za")).await;
    let who = registrant("nomsa@gmail.com");

    let redemption = f
        .service
        .redeem_code(clinic.id, SEEDED_CODE, &who, RedeemOptions::admin_override(f.admin.clone()))
        .await
        .unwrap();

    assert_eq!(redemption.clinic.admin_user_id, Some(who.user_id));
}

#[tokio::test]
async fn non_admin_override_is_forbidden() {
    let f = Fixture::new();
    let clinic = f.seed_clinic(Some("info@alexhealth.org.za")).await;
    let doctor = TestUser::doctor("dr@alexhealth.org.za").to_actor(Some(Uuid::new_v4()));

    assert_matches!(
        f.service
            .redeem_code(
                clinic.id,
                SEEDED_CODE,
                &registrant("nomsa@gmail.com"),
                RedeemOptions::admin_override(doctor),
            )
            .await,
        Err(ClinicError::Forbidden(_))
    );
    assert_matches!(
        f.service
            .redeem_code(
                clinic.id,
                SEEDED_CODE,
                &registrant("nomsa@gmail.com"),
                RedeemOptions { override_email_domain: true, requested_by: None },
            )
            .await,
        Err(ClinicError::Forbidden(_))
    );
}

#[tokio::test]
async fn roleless_registrant_is_gated_by_the_code_alone() {
    let f = Fixture::new();
    let clinic = f.seed_clinic(Some("info@alexhealth.org.za")).await;
    let newcomer = registrant("nomsa@alexhealth.org.za");

    assert_matches!(
        f.service
            .redeem_code(clinic.id, "WRONG1", &newcomer, RedeemOptions::default())
            .await,
        Err(ClinicError::CodeMismatch)
    );
    assert_eq!(f.store.grant_for(newcomer.user_id).await, None);
    assert!(!f.stored(clinic.id).await.code_used);

    let redemption = f
        .service
        .redeem_code(clinic.id, SEEDED_CODE, &newcomer, RedeemOptions::default())
        .await
        .unwrap();
    assert_eq!(redemption.admin_user_id, newcomer.user_id);
}

#[tokio::test]
async fn malformed_registrant_email_is_a_validation_error() {
    let f = Fixture::new();
    let clinic = f.seed_clinic(None).await;

    assert_matches!(
        f.service
            .redeem_code(clinic.id, SEEDED_CODE, &registrant("not-an-email"), RedeemOptions::default())
            .await,
        Err(ClinicError::Validation(_))
    );
}

#[tokio::test]
async fn created_clinic_comes_with_unused_code() {
    let f = Fixture::new();

    let clinic = f
        .service
        .create_clinic(
            &f.admin,
            CreateClinicRequest {
                name: "  Diepsloot Community Clinic ".to_string(),
                province: Some("Gauteng".to_string()),
                city: None,
                address: None,
                phone: None,
                email: Some("info@diepslootclinic.org.za".to_string()),
            },
        )
        .await
        .unwrap();

    assert_eq!(clinic.name, "Diepsloot Community Clinic");
    assert!(!clinic.code_used);
    assert!(clinic.registration_code.as_deref().is_some_and(|c| c.starts_with("CLINIC-")));
    assert_eq!(f.stored(clinic.id).await.id, clinic.id);
}

#[tokio::test]
async fn clinic_creation_is_admin_only() {
    let f = Fixture::new();
    let patient = TestUser::patient("p@example.com").to_actor(Some(Uuid::new_v4()));

    assert_matches!(
        f.service
            .create_clinic(
                &patient,
                CreateClinicRequest {
                    name: "Anything".to_string(),
                    province: None,
                    city: None,
                    address: None,
                    phone: None,
                    email: None,
                },
            )
            .await,
        Err(ClinicError::Forbidden(_))
    );
}
