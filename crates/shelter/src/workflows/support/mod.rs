//! Support requests sent from the contact form and handled by staff.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{SupportForm, SupportRequest, SupportRequestId, SupportStatus, SupportSubject};
pub use repository::{InMemorySupportRepository, SupportRepository};
pub use router::support_router;
pub use service::{SupportError, SupportService};

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Barrier};
    use std::thread;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use chrono::NaiveDate;
    use serde_json::json;
    use tower::ServiceExt;

    use super::*;
    use crate::workflows::clock::FixedClock;
    use crate::workflows::identity::{Actor, UserId, ROLE_HEADER, USER_HEADER};

    fn service() -> SupportService<InMemorySupportRepository> {
        let day = NaiveDate::from_ymd_opt(2025, 10, 1).unwrap();
        SupportService::with_clock(
            Arc::new(InMemorySupportRepository::new()),
            Arc::new(FixedClock::on(day)),
        )
    }

    fn form(subject: SupportSubject) -> SupportForm {
        SupportForm {
            name: "Anna".to_string(),
            email: "anna@example.org".to_string(),
            subject,
            message: "How can I volunteer on weekends?".to_string(),
        }
    }

    #[test]
    fn submission_starts_new_and_keeps_the_sender() {
        let service = service();
        let request = service
            .submit(form(SupportSubject::Volunteer), &Actor::visitor(UserId(3)))
            .unwrap();
        assert_eq!(request.status, SupportStatus::New);
        assert_eq!(request.user_id, Some(UserId(3)));

        let mut blank = form(SupportSubject::Other);
        blank.message = "  ".to_string();
        match service.submit(blank, &Actor::anonymous()) {
            Err(SupportError::Validation(error)) => assert_eq!(error.field, "message"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn bulk_status_update_is_checked_before_writing() {
        let service = service();
        let first = service
            .submit(form(SupportSubject::Adoption), &Actor::anonymous())
            .unwrap();
        let second = service
            .submit(form(SupportSubject::Technical), &Actor::anonymous())
            .unwrap();
        service
            .update_status(&[second.id], SupportStatus::Closed)
            .unwrap();

        let result = service.update_status(&[first.id, second.id], SupportStatus::Resolved);
        assert!(matches!(result, Err(SupportError::Conflict(_))));
        assert_eq!(
            service.requests(Some(SupportStatus::New)).unwrap().len(),
            1,
            "first request must be untouched"
        );

        let updated = service
            .update_status(&[first.id], SupportStatus::InProgress)
            .unwrap();
        assert_eq!(updated[0].status, SupportStatus::InProgress);
        service
            .update_status(&[first.id], SupportStatus::InProgress)
            .expect("repeating the current status is a no-op");
    }

    #[test]
    fn unknown_request_aborts_the_whole_batch() {
        let service = service();
        let request = service
            .submit(form(SupportSubject::Other), &Actor::anonymous())
            .unwrap();

        let result = service.update_status(
            &[request.id, SupportRequestId(u64::MAX)],
            SupportStatus::Resolved,
        );
        assert!(matches!(result, Err(SupportError::NotFound(_))));
        assert_eq!(service.requests(Some(SupportStatus::New)).unwrap().len(), 1);
    }

    #[test]
    fn concurrent_batches_never_reopen_a_closed_request() {
        for _ in 0..50 {
            let service = service();
            let request = service
                .submit(form(SupportSubject::Adoption), &Actor::anonymous())
                .unwrap();
            let barrier = Barrier::new(2);

            let (progress, close) = thread::scope(|scope| {
                let progress = scope.spawn(|| {
                    barrier.wait();
                    service.update_status(&[request.id], SupportStatus::InProgress)
                });
                let close = scope.spawn(|| {
                    barrier.wait();
                    service.update_status(&[request.id], SupportStatus::Closed)
                });
                (
                    progress.join().expect("progress thread"),
                    close.join().expect("close thread"),
                )
            });

            assert!(close.is_ok());
            if progress.is_err() {
                assert!(matches!(progress, Err(SupportError::Conflict(_))));
            }
            assert_eq!(
                service.requests(None).unwrap()[0].status,
                SupportStatus::Closed
            );
        }
    }

    #[test]
    fn responding_moves_new_requests_forward() {
        let service = service();
        let request = service
            .submit(form(SupportSubject::Donation), &Actor::anonymous())
            .unwrap();

        let answered = service
            .respond(request.id, "Use the donations page.")
            .unwrap();
        assert_eq!(answered.status, SupportStatus::InProgress);
        assert_eq!(answered.response, "Use the donations page.");

        service
            .update_status(&[request.id], SupportStatus::Closed)
            .unwrap();
        assert!(matches!(
            service.respond(request.id, "again"),
            Err(SupportError::Conflict(_))
        ));
        assert!(matches!(
            service.respond(SupportRequestId(u64::MAX), "hello"),
            Err(SupportError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn listing_is_staff_only() {
        let app = support_router(Arc::new(service()));

        let submitted = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/support")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        serde_json::to_vec(&json!({
                            "name": "Anna",
                            "email": "anna@example.org",
                            "subject": "technical",
                            "message": "The page does not load",
                        }))
                        .unwrap(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(submitted.status(), StatusCode::CREATED);

        let visitor = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/support")
                    .header(USER_HEADER, "5")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(visitor.status(), StatusCode::FORBIDDEN);

        let staff = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/support?status=new")
                    .header(USER_HEADER, "1")
                    .header(ROLE_HEADER, "staff")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(staff.status(), StatusCode::OK);
    }
}
