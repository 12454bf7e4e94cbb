//! End-to-end listing scenarios driven through the public service facade and HTTP router.

mod common {
    use std::collections::{BTreeMap, HashMap};
    use std::sync::{Arc, Mutex};

    use ktm_property_hub::listings::{
        AuthError, Authenticator, ImageStore, ImageStoreError, Listing, ListingDetails, ListingId,
        ListingPolicy, ListingPurpose, ListingRepository, ListingService, ListingSubmission,
        Principal, PropertyType, RepositoryError,
    };

    #[derive(Default, Clone)]
    pub(super) struct MemoryRepository {
        rows: Arc<Mutex<BTreeMap<ListingId, Listing>>>,
    }

    impl ListingRepository for MemoryRepository {
        fn insert(&self, mut listing: Listing) -> Result<Listing, RepositoryError> {
            let mut guard = self.rows.lock().expect("lock");
            let next = guard.keys().next_back().map_or(1, |id| id.0 + 1);
            listing.id = ListingId(next);
            guard.insert(listing.id, listing.clone());
            Ok(listing)
        }

        fn update(&self, mut listing: Listing) -> Result<Listing, RepositoryError> {
            let mut guard = self.rows.lock().expect("lock");
            let row = guard.get_mut(&listing.id).ok_or(RepositoryError::NotFound)?;
            if row.revision != listing.revision {
                return Err(RepositoryError::Conflict);
            }
            listing.revision += 1;
            *row = listing.clone();
            Ok(listing)
        }

        fn fetch(&self, id: ListingId) -> Result<Option<Listing>, RepositoryError> {
            Ok(self.rows.lock().expect("lock").get(&id).cloned())
        }

        fn delete(&self, id: ListingId) -> Result<(), RepositoryError> {
            self.rows
                .lock()
                .expect("lock")
                .remove(&id)
                .map(|_| ())
                .ok_or(RepositoryError::NotFound)
        }

        fn all(&self) -> Result<Vec<Listing>, RepositoryError> {
            Ok(self.rows.lock().expect("lock").values().cloned().collect())
        }
    }

    #[derive(Default, Clone)]
    pub(super) struct MemoryImages {
        blobs: Arc<Mutex<HashMap<String, usize>>>,
    }

    impl MemoryImages {
        pub(super) fn stored(&self) -> usize {
            self.blobs.lock().expect("lock").len()
        }
    }

    impl ImageStore for MemoryImages {
        fn store(
            &self,
            key: &str,
            _content_type: &mime::Mime,
            bytes: &[u8],
        ) -> Result<String, ImageStoreError> {
            let reference = format!("memory://{key}");
            self.blobs
                .lock()
                .expect("lock")
                .insert(reference.clone(), bytes.len());
            Ok(reference)
        }

        fn remove(&self, reference: &str) -> Result<(), ImageStoreError> {
            self.blobs
                .lock()
                .expect("lock")
                .remove(reference)
                .map(|_| ())
                .ok_or_else(|| ImageStoreError::Missing(reference.to_string()))
        }
    }

    /// `sita-token` and `hari-token` are regular users, `admin-token` is staff.
    #[derive(Default, Clone)]
    pub(super) struct TokenAuth;

    impl Authenticator for TokenAuth {
        fn authenticate(&self, token: &str) -> Result<Principal, AuthError> {
            match token {
                "sita-token" => Ok(Principal::user("sita")),
                "hari-token" => Ok(Principal::user("hari")),
                "admin-token" => Ok(Principal::staff("admin")),
                _ => Err(AuthError::InvalidCredentials),
            }
        }
    }

    pub(super) type Service = ListingService<MemoryRepository, MemoryImages>;

    pub(super) fn build_service(
        policy: ListingPolicy,
    ) -> (Service, Arc<MemoryRepository>, Arc<MemoryImages>) {
        let repository = Arc::new(MemoryRepository::default());
        let images = Arc::new(MemoryImages::default());
        let service = ListingService::new(repository.clone(), images.clone(), policy);
        (service, repository, images)
    }

    pub(super) fn land_submission(title: &str) -> ListingSubmission {
        let mut details = ListingDetails::new(ListingPurpose::Sell, PropertyType::Land, title);
        details.state = Some("Bagmati".to_string());
        details.district = Some("Lalitpur".to_string());
        ListingSubmission::new(details)
    }
}

mod service {
    use super::common::*;
    use ktm_property_hub::listings::{
        ImageUpload, ListingPolicy, ListingQuery, ListingRepository, ListingServiceError,
        ListingValidationError, Principal, RepositoryError,
    };

    #[test]
    fn terai_units_are_normalized_before_storage() {
        let (service, repository, _) = build_service(ListingPolicy::default());
        let mut submission = land_submission("Bara highway frontage");
        submission.land.bigha = Some(1);
        submission.land.katha = Some(2);

        let created = service
            .create(&Principal::user("sita"), submission)
            .expect("listing created");
        let stored = repository
            .fetch(created.id)
            .expect("repo fetch")
            .expect("listing present");

        assert_eq!(stored.land.total_area_sqft, Some(80190.0));
        assert_eq!(stored.land.ropani, None);
        assert_eq!(stored.details.district.as_deref(), Some("Lalitpur"));
    }

    #[test]
    fn lenient_policy_lets_hilly_units_win() {
        let (service, _, _) = build_service(ListingPolicy {
            strict_area_units: false,
        });
        let mut submission = land_submission("Mixed survey");
        submission.land.ropani = Some(2);
        submission.land.bigha = Some(5);

        let created = service
            .create(&Principal::user("sita"), submission)
            .expect("listing created");
        assert_eq!(created.land.ropani, Some(2));
        assert_eq!(created.land.bigha, None);
        assert_eq!(created.land.total_area_sqft, Some(10952.0));
    }

    #[test]
    fn strict_policy_rejects_mixed_units_without_storing() {
        let (service, repository, _) = build_service(ListingPolicy::default());
        let mut submission = land_submission("Mixed survey");
        submission.land.aana = Some(4);
        submission.land.dhur = Some(10);

        match service.create(&Principal::user("sita"), submission) {
            Err(ListingServiceError::Validation(ListingValidationError::MixedUnitSystems)) => {}
            other => panic!("expected mixed unit rejection, got {other:?}"),
        }
        assert!(repository.all().expect("all").is_empty());
    }

    #[test]
    fn clearing_units_on_update_clears_the_total() {
        let (service, _, _) = build_service(ListingPolicy::default());
        let sita = Principal::user("sita");
        let mut submission = land_submission("Godawari plot");
        submission.land.ropani = Some(1);
        let created = service.create(&sita, submission).expect("created");
        assert_eq!(created.land.total_area_sqft, Some(5476.0));

        let updated = service
            .update(&sita, created.id, land_submission("Godawari plot"))
            .expect("updated");
        assert_eq!(updated.land.total_area_sqft, None);
        assert_eq!(updated.land.ropani, None);
        assert_eq!(updated.created_at, created.created_at);
    }

    #[test]
    fn only_owner_or_staff_may_edit() {
        let (service, _, _) = build_service(ListingPolicy::default());
        let created = service
            .create(&Principal::user("sita"), land_submission("Lubhu plot"))
            .expect("created");

        match service.update(
            &Principal::user("hari"),
            created.id,
            land_submission("Hijacked"),
        ) {
            Err(ListingServiceError::Forbidden { .. }) => {}
            other => panic!("expected forbidden, got {other:?}"),
        }

        let edited = service
            .update(
                &Principal::staff("admin"),
                created.id,
                land_submission("Lubhu plot, moderated"),
            )
            .expect("staff edit");
        assert_eq!(edited.details.title, "Lubhu plot, moderated");
        assert_eq!(edited.owner, created.owner);
    }

    #[test]
    fn inactive_listings_are_hidden_from_strangers() {
        let (service, _, _) = build_service(ListingPolicy::default());
        let mut submission = land_submission("Draft listing");
        submission.details.is_active = false;
        let sita = Principal::user("sita");
        let created = service.create(&sita, submission).expect("created");

        assert!(matches!(
            service.get(None, created.id),
            Err(ListingServiceError::NotFound(_))
        ));
        assert!(service.get(Some(&sita), created.id).is_ok());
        let page = service.search(&ListingQuery::default()).expect("search");
        assert_eq!(page.count, 0);
    }

    #[test]
    fn new_thumbnail_replaces_previous_one() {
        let (service, _, images) = build_service(ListingPolicy::default());
        let sita = Principal::user("sita");
        let created = service
            .create(&sita, land_submission("Thecho plot"))
            .expect("created");

        let upload = |is_thumbnail| ImageUpload {
            content_type: mime::IMAGE_PNG,
            bytes: vec![0x89, 0x50, 0x4e, 0x47],
            caption: Some("  road view ".to_string()),
            is_thumbnail,
        };
        let first = service
            .attach_image(&sita, created.id, upload(true))
            .expect("first image");
        let second = service
            .attach_image(&sita, created.id, upload(true))
            .expect("second image");
        assert_ne!(first.id, second.id);
        assert_eq!(second.caption.as_deref(), Some("road view"));

        let listing = service.get(Some(&sita), created.id).expect("listing");
        let thumbnails: Vec<_> = listing
            .images
            .iter()
            .filter(|image| image.is_thumbnail)
            .collect();
        assert_eq!(thumbnails.len(), 1);
        assert_eq!(thumbnails[0].id, second.id);
        assert_eq!(images.stored(), 2);

        service
            .remove_image(&sita, created.id, first.id)
            .expect("image removed");
        assert_eq!(images.stored(), 1);

        service.delete(&sita, created.id).expect("deleted");
        assert_eq!(images.stored(), 0);
    }

    #[test]
    fn image_ids_are_not_reused_after_removal() {
        let (service, _, _) = build_service(ListingPolicy::default());
        let sita = Principal::user("sita");
        let created = service
            .create(&sita, land_submission("Chapagaun plot"))
            .expect("created");

        let upload = || ImageUpload {
            content_type: mime::IMAGE_JPEG,
            bytes: vec![0xff, 0xd8, 0xff],
            caption: None,
            is_thumbnail: false,
        };
        let first = service
            .attach_image(&sita, created.id, upload())
            .expect("first image");
        let second = service
            .attach_image(&sita, created.id, upload())
            .expect("second image");
        service
            .remove_image(&sita, created.id, second.id)
            .expect("removed");

        let third = service
            .attach_image(&sita, created.id, upload())
            .expect("third image");
        assert_ne!(third.id, second.id);
        assert_ne!(third.image, second.image);
        assert!(matches!(
            service.remove_image(&sita, created.id, second.id),
            Err(ListingServiceError::ImageNotFound { .. })
        ));

        let listing = service.get(Some(&sita), created.id).expect("listing");
        let ids: Vec<_> = listing.images.iter().map(|image| image.id).collect();
        assert_eq!(ids, vec![first.id, third.id]);
    }

    #[test]
    fn stale_write_cannot_drop_an_attached_image() {
        let (service, repository, _) = build_service(ListingPolicy::default());
        let sita = Principal::user("sita");
        let created = service
            .create(&sita, land_submission("Harisiddhi plot"))
            .expect("created");
        let stale = repository
            .fetch(created.id)
            .expect("repo fetch")
            .expect("listing present");

        let image = service
            .attach_image(
                &sita,
                created.id,
                ImageUpload {
                    content_type: mime::IMAGE_PNG,
                    bytes: vec![0x89, 0x50],
                    caption: None,
                    is_thumbnail: true,
                },
            )
            .expect("image attached");

        assert!(matches!(
            repository.update(stale),
            Err(RepositoryError::Conflict)
        ));
        let stored = repository
            .fetch(created.id)
            .expect("repo fetch")
            .expect("listing present");
        assert_eq!(stored.images.len(), 1);
        assert_eq!(stored.images[0].id, image.id);
    }

    #[test]
    fn non_image_uploads_are_rejected() {
        let (service, _, images) = build_service(ListingPolicy::default());
        let sita = Principal::user("sita");
        let created = service
            .create(&sita, land_submission("Sunakothi plot"))
            .expect("created");

        let upload = ImageUpload {
            content_type: mime::APPLICATION_PDF,
            bytes: b"%PDF".to_vec(),
            caption: None,
            is_thumbnail: false,
        };
        assert!(matches!(
            service.attach_image(&sita, created.id, upload),
            Err(ListingServiceError::UnsupportedImage(_))
        ));
        assert_eq!(images.stored(), 0);
    }
}

mod routing {
    use super::common::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use axum::response::Response;
    use ktm_property_hub::listings::{listing_router, ListingPolicy, ListingRepository};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn build_router() -> (axum::Router, Arc<MemoryRepository>) {
        let (service, repository, _) = build_service(ListingPolicy::default());
        (
            listing_router(Arc::new(service), Arc::new(TokenAuth)),
            repository,
        )
    }

    fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    async fn read_json(response: Response) -> Value {
        let body = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("body");
        serde_json::from_slice(&body).expect("json")
    }

    fn plot(title: &str, units: Value) -> Value {
        let mut payload = json!({
            "listing_purpose": "SELL",
            "property_type": "LAND",
            "title": title,
            "state": "bagmati",
            "district": "kathmandu",
        });
        if let (Some(target), Some(units)) = (payload.as_object_mut(), units.as_object()) {
            target.extend(units.clone());
        }
        payload
    }

    #[tokio::test]
    async fn create_reports_canonical_area() {
        let (router, _) = build_router();
        let response = router
            .oneshot(json_request(
                "POST",
                "/api/properties",
                Some("sita-token"),
                plot("Tokha plot", json!({ "ropani": 1, "aana": 4 })),
            ))
            .await
            .expect("router dispatch");

        assert_eq!(response.status(), StatusCode::CREATED);
        let payload = read_json(response).await;
        assert_eq!(payload["total_area_sqft"], json!(6845.0));
        assert_eq!(payload["state"], json!("Bagmati"));
        assert_eq!(payload["district"], json!("Kathmandu"));
        assert_eq!(payload["bigha"], Value::Null);
    }

    #[tokio::test]
    async fn negative_units_return_field_error() {
        let (router, repository) = build_router();
        let response = router
            .oneshot(json_request(
                "POST",
                "/api/properties",
                Some("sita-token"),
                plot("Broken survey", json!({ "dhur": -3 })),
            ))
            .await
            .expect("router dispatch");

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let payload = read_json(response).await;
        assert_eq!(payload["field"], json!("dhur"));
        assert!(repository.all().expect("all").is_empty());
    }

    #[tokio::test]
    async fn writes_require_a_bearer_token() {
        let (router, _) = build_router();
        let response = router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/properties",
                None,
                plot("Anonymous plot", json!({})),
            ))
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response
                .headers()
                .get(header::WWW_AUTHENTICATE)
                .and_then(|value| value.to_str().ok()),
            Some("Bearer")
        );

        let response = router
            .oneshot(json_request(
                "POST",
                "/api/properties",
                Some("stolen-token"),
                plot("Anonymous plot", json!({})),
            ))
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn strangers_cannot_delete() {
        let (router, _) = build_router();
        let created = read_json(
            router
                .clone()
                .oneshot(json_request(
                    "POST",
                    "/api/properties",
                    Some("sita-token"),
                    plot("Kapan plot", json!({ "aana": 8 })),
                ))
                .await
                .expect("router dispatch"),
        )
        .await;
        let id = created["id"].as_u64().expect("numeric id");

        let request = Request::builder()
            .method("DELETE")
            .uri(format!("/api/properties/{id}"))
            .header(header::AUTHORIZATION, "Bearer hari-token")
            .body(Body::empty())
            .expect("request");
        let response = router
            .clone()
            .oneshot(request)
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let request = Request::builder()
            .method("DELETE")
            .uri(format!("/api/properties/{id}"))
            .header(header::AUTHORIZATION, "Bearer admin-token")
            .body(Body::empty())
            .expect("request");
        let response = router.oneshot(request).await.expect("router dispatch");
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn search_filters_and_orders_by_area() {
        let (router, _) = build_router();
        for (title, units) in [
            ("Small plot", json!({ "aana": 4 })),
            ("Large plot", json!({ "ropani": 3 })),
            ("Medium plot", json!({ "ropani": 1 })),
            ("Terai plot", json!({ "katha": 1 })),
            ("Unmeasured plot", json!({})),
        ] {
            let response = router
                .clone()
                .oneshot(json_request(
                    "POST",
                    "/api/properties",
                    Some("sita-token"),
                    plot(title, units),
                ))
                .await
                .expect("router dispatch");
            assert_eq!(response.status(), StatusCode::CREATED);
        }

        let request = Request::builder()
            .uri("/api/properties?min_area_sqft=2000&ordering=-total_area_sqft")
            .body(Body::empty())
            .expect("request");
        let payload = read_json(
            router
                .clone()
                .oneshot(request)
                .await
                .expect("router dispatch"),
        )
        .await;
        assert_eq!(payload["count"], json!(3));
        assert_eq!(
            titles(&payload),
            vec!["Large plot", "Medium plot", "Terai plot"]
        );

        let request = Request::builder()
            .uri("/api/properties?max_area_sqft=3000&ordering=total_area_sqft")
            .body(Body::empty())
            .expect("request");
        let payload = read_json(router.oneshot(request).await.expect("router dispatch")).await;
        assert_eq!(payload["count"], json!(1));
        assert_eq!(titles(&payload), vec!["Small plot"]);
    }

    fn titles(page: &Value) -> Vec<&str> {
        page["results"]
            .as_array()
            .expect("results array")
            .iter()
            .filter_map(|listing| listing["title"].as_str())
            .collect()
    }

    #[tokio::test]
    async fn image_upload_requires_image_content() {
        let (router, _) = build_router();
        let created = read_json(
            router
                .clone()
                .oneshot(json_request(
                    "POST",
                    "/api/properties",
                    Some("sita-token"),
                    plot("Dhapasi plot", json!({ "ropani": 2 })),
                ))
                .await
                .expect("router dispatch"),
        )
        .await;
        let id = created["id"].as_u64().expect("numeric id");

        let request = Request::builder()
            .method("POST")
            .uri(format!("/api/properties/{id}/images?is_thumbnail=true&caption=Front"))
            .header(header::AUTHORIZATION, "Bearer sita-token")
            .header(header::CONTENT_TYPE, "image/jpeg")
            .body(Body::from(vec![0xff, 0xd8, 0xff]))
            .expect("request");
        let response = router
            .clone()
            .oneshot(request)
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::CREATED);
        let image = read_json(response).await;
        assert_eq!(image["is_thumbnail"], json!(true));
        assert_eq!(image["caption"], json!("Front"));

        let request = Request::builder()
            .method("POST")
            .uri(format!("/api/properties/{id}/images"))
            .header(header::AUTHORIZATION, "Bearer sita-token")
            .header(header::CONTENT_TYPE, "text/plain")
            .body(Body::from("not an image"))
            .expect("request");
        let response = router.oneshot(request).await.expect("router dispatch");
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn districts_are_listed_per_state() {
        let (router, _) = build_router();
        let request = Request::builder()
            .uri("/api/districts?state=Bagmati")
            .body(Body::empty())
            .expect("request");
        let response = router
            .clone()
            .oneshot(request)
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::OK);
        let payload = read_json(response).await;
        let names: Vec<&str> = payload
            .as_array()
            .expect("district array")
            .iter()
            .filter_map(|district| district["name"].as_str())
            .collect();
        assert!(names.contains(&"Kathmandu"));
        assert!(!names.contains(&"Jhapa"));

        let request = Request::builder()
            .uri("/api/districts?state=Atlantis")
            .body(Body::empty())
            .expect("request");
        let response = router.oneshot(request).await.expect("router dispatch");
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
