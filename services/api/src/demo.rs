use crate::infra::ShelterServices;
use chrono::{Duration, Local, NaiveDate};
use clap::Args;
use rust_decimal::Decimal;
use shelter::config::ShelterConfig;
use shelter::error::AppError;
use shelter::workflows::accounts::RegistrationForm;
use shelter::workflows::catalog::CatalogQuery;
use shelter::workflows::clock::FixedClock;
use shelter::workflows::donations::{DonationForm, PaymentStatus};
use shelter::workflows::identity::Actor;
use shelter::workflows::lifecycle::{Animal, AnimalKind, VisitorInfo};
use shelter::workflows::support::{SupportForm, SupportSubject};
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Calendar date the scenario runs on (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Skip the donation portion of the demo.
    #[arg(long)]
    pub(crate) skip_donations: bool,
}

fn visitor(actor: &Actor, name: &str, email: &str) -> VisitorInfo {
    VisitorInfo {
        user_id: actor.user_id,
        name: name.to_string(),
        phone: "+79161234567".to_string(),
        email: email.to_string(),
        comment: "We have a fenced garden.".to_string(),
    }
}

fn register(services: &ShelterServices, username: &str, first_name: &str) -> Actor {
    let form = RegistrationForm {
        username: username.to_string(),
        email: format!("{username}@example.org"),
        first_name: first_name.to_string(),
        last_name: "Demo".to_string(),
        phone: String::new(),
        password: format!("{username}-secret"),
        password_confirm: format!("{username}-secret"),
    };
    match services.accounts.register(form) {
        Ok(user) => {
            println!("  Registered {} as user #{}", user.display_name(), user.id);
            Actor::visitor(user.id)
        }
        Err(err) => {
            println!("  Registration failed for {username}: {err}");
            Actor::anonymous()
        }
    }
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let visit_date = today + Duration::days(2);
    let services = ShelterServices::in_memory(
        &ShelterConfig::default(),
        Arc::new(FixedClock::on(today)),
    );

    println!("Animal shelter workflow demo");
    println!("Scenario date: {today} (visits booked for {visit_date})");

    let seeded = services.seed_demo_animals()?;
    println!("\nRegistered {seeded} animals");
    print_catalog(&services);

    println!("\nAccounts");
    let anna = register(&services, "anna", "Anna");
    let boris = register(&services, "boris", "Boris");
    println!(
        "\nVisitors enrolled with the identity provider: {}",
        services.identity.enrolled()
    );

    let Some(bella) = first_of_kind(&services, AnimalKind::Dog, "Bella") else {
        println!("Bella is missing from the catalog; nothing to demo");
        return Ok(());
    };

    println!("\nReservation scenario for {}", bella.title());
    let reservation = services.lifecycle.request_reservation(
        bella.id,
        visitor(&anna, "Anna", "anna@example.org"),
        visit_date,
    )?;
    println!(
        "  Anna reserved a visit (#{}), status: {}",
        reservation.id,
        reservation.status.label()
    );
    match services.lifecycle.request_reservation(
        bella.id,
        visitor(&boris, "Boris", "boris@example.org"),
        visit_date,
    ) {
        Ok(_) => println!("  Boris also reserved Bella (unexpected)"),
        Err(err) => println!("  Boris was turned away: {err}"),
    }
    services.lifecycle.cancel_reservation(reservation.id, &anna)?;
    let availability = services.lifecycle.check_availability(bella.id)?;
    println!(
        "  Anna cancelled; Bella is now: {} (available: {})",
        availability.status_label, availability.available
    );

    println!("\nAdoption scenario");
    let adoption = services
        .lifecycle
        .submit_adoption(bella.id, &boris, "Experienced with large dogs")?;
    println!("  Boris applied (#{}), status: {}", adoption.id, adoption.status.label());
    let approved = services.lifecycle.approve_adoption(adoption.id)?;
    println!(
        "  Staff approved on {}; Bella is {}",
        approved
            .adoption_date
            .map(|date| date.to_string())
            .unwrap_or_else(|| "-".to_string()),
        services.lifecycle.animal(bella.id)?.status.label()
    );
    match services.lifecycle.approve_adoption(adoption.id) {
        Ok(_) => println!("  Second approval accepted (unexpected)"),
        Err(err) => println!("  Second approval refused: {err}"),
    }
    services.lifecycle.complete_adoption(adoption.id)?;
    println!("  Handover completed");

    if !args.skip_donations {
        run_donations(&services, &anna);
    }

    let question = SupportForm {
        name: "Anna".to_string(),
        email: "anna@example.org".to_string(),
        subject: SupportSubject::Volunteer,
        message: "Can I walk dogs on weekends?".to_string(),
    };
    match services.support.submit(question, &anna) {
        Ok(request) => println!(
            "\nSupport request #{} filed ({}), status: {}",
            request.id.0,
            request.subject.label(),
            request.status.label()
        ),
        Err(err) => println!("\nSupport request rejected: {err}"),
    }

    match services.catalog.stats() {
        Ok(stats) => println!(
            "\nShelter stats: {} animals, {} adopted, {} available",
            stats.total, stats.adopted, stats.available
        ),
        Err(err) => println!("\nShelter stats unavailable: {err}"),
    }
    Ok(())
}

fn print_catalog(services: &ShelterServices) {
    match services.catalog.list_animals(&CatalogQuery::default()) {
        Ok(page) => {
            println!(
                "Catalog page {} of {} ({} available)",
                page.page, page.num_pages, page.total
            );
            for animal in &page.items {
                println!(
                    "  {} {} - {}",
                    animal.animal_type.emoji(),
                    animal.title(),
                    animal.description
                );
            }
        }
        Err(err) => println!("Catalog unavailable: {err}"),
    }
}

fn first_of_kind(services: &ShelterServices, kind: AnimalKind, name: &str) -> Option<Animal> {
    let query = CatalogQuery {
        animal_type: Some(kind.slug().to_string()),
        search: Some(name.to_string()),
        ..CatalogQuery::default()
    };
    services
        .catalog
        .list_animals(&query)
        .ok()
        .and_then(|page| page.items.into_iter().next())
}

fn run_donations(services: &ShelterServices, donor: &Actor) {
    println!("\nDonations");
    let pledges = [
        (Decimal::new(150_000, 2), false),
        (Decimal::new(50_000, 2), true),
    ];
    let mut settled = Vec::new();
    for (amount, is_anonymous) in pledges {
        let form = DonationForm {
            name: String::new(),
            email: String::new(),
            amount,
            message: "For food and vaccines".to_string(),
            is_anonymous,
        };
        match services.donations.donate(form, donor) {
            Ok(donation) => {
                let name = services
                    .donations
                    .donor_name(&donation)
                    .unwrap_or_else(|err| format!("<{err}>"));
                println!("  {name} pledged {}", donation.amount);
                settled.push(donation.id);
            }
            Err(err) => println!("  Donation rejected: {err}"),
        }
    }

    if let Err(err) =
        services
            .donations
            .update_payment_status(&settled, PaymentStatus::Completed, Some("demo-batch"))
    {
        println!("  Settlement failed: {err}");
    }
    match services.donations.top_donors() {
        Ok(donors) if donors.is_empty() => println!("  Top donors: none yet"),
        Ok(donors) => println!("  Top donors: {}", donors.join(", ")),
        Err(err) => println!("  Top donors unavailable: {err}"),
    }
}
