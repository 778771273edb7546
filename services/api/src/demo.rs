use crate::infra::{
    InMemoryAuthDirectory, InMemoryFavoriteStore, InMemoryListingStore, InMemoryMessagingStore,
    InMemoryNotificationStore, InMemoryProfileStore,
};
use clap::Args;
use haven::auth::AuthProvider;
use haven::domain::{
    GeoPoint, ListingCategory, ListingKind, ListingLocation, NotificationKind, OwnerSummary,
    RentPeriod,
};
use haven::error::AppError;
use haven::favorites::FavoritesService;
use haven::geo::{Geocoder, StaticGeocoder};
use haven::listings::{ListingDraft, ListingQuery, ListingService};
use haven::messaging::{ConversationSeed, MessagingService};
use haven::notifications::NotificationService;
use haven::profiles::ProfileService;
use haven::search::{SearchFilters, SortKey};
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Restrict the browse step to one city
    #[arg(long)]
    pub(crate) city: Option<String>,
    /// Sort key for the browse step (relevance, price_asc, price_desc, date_desc)
    #[arg(long)]
    pub(crate) sort: Option<String>,
    /// Upper price bound for the browse step (raw text, parsed leniently)
    #[arg(long)]
    pub(crate) price_max: Option<String>,
    /// Skip the messaging portion of the demo
    #[arg(long)]
    pub(crate) skip_messaging: bool,
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        city,
        sort,
        price_max,
        skip_messaging,
    } = args;

    println!("Haven listings demo");

    let auth = Arc::new(InMemoryAuthDirectory::default());
    let owner_account = auth
        .sign_up("nadia@example.com", "secret1", "Nadia")
        .await?;
    let buyer_account = auth
        .sign_up("karim@example.com", "secret2", "Karim")
        .await?;

    let profiles = ProfileService::new(Arc::new(InMemoryProfileStore::default()), auth.clone());
    profiles.register(&owner_account).await?;
    profiles.register(&buyer_account).await?;
    println!(
        "Accounts: {} <{}>, {} <{}>",
        owner_account.display_name,
        owner_account.email,
        buyer_account.display_name,
        buyer_account.email
    );

    let geocoder = StaticGeocoder::with_defaults();
    let listings = Arc::new(ListingService::new(Arc::new(
        InMemoryListingStore::default(),
    )));
    let owner = OwnerSummary {
        id: owner_account.id.clone(),
        display_name: owner_account.display_name.clone(),
        photo_url: None,
    };

    let seeds = [
        ("Bright two-bedroom near the park", "Lyon", 980.0, ListingKind::ForRent, ListingCategory::Apartment, 2, vec!["Parking", "Balcony"]),
        ("Compact studio by the river", "Lyon", 640.0, ListingKind::ForRent, ListingCategory::Studio, 0, vec!["Elevator"]),
        ("Family house with a garden", "Bordeaux", 385_000.0, ListingKind::ForSale, ListingCategory::House, 4, vec!["Garden", "Parking"]),
    ];

    for (title, seed_city, price, kind, category, bedrooms, amenities) in seeds {
        let point = geocoder
            .forward(seed_city)
            .await
            .ok()
            .flatten()
            .unwrap_or(GeoPoint {
                latitude: 48.8566,
                longitude: 2.3522,
            });
        let draft = ListingDraft {
            title: title.to_string(),
            description: format!("{title}, freshly listed in {seed_city}."),
            price,
            kind,
            category,
            bedrooms,
            bathrooms: 1,
            area: 30.0 + 25.0 * bedrooms as f64,
            location: ListingLocation {
                address: format!("14 Quai des Ormes, {seed_city}"),
                city: seed_city.to_string(),
                country: "France".to_string(),
                point,
            },
            images: vec![format!("https://images.example/demo/{bedrooms}.jpg")],
            amenities: amenities.into_iter().map(str::to_string).collect(),
            rent_period: matches!(kind, ListingKind::ForRent).then_some(RentPeriod::Month),
            featured: false,
        };
        listings.publish(owner.clone(), draft).await?;
    }

    let coarse = ListingQuery {
        kind: None,
        status: None,
        city: city.clone(),
    };
    let mut filters = SearchFilters::none();
    if let Some(raw) = price_max.as_deref() {
        filters.set_price_max_raw(raw);
    }
    let sort = sort
        .as_deref()
        .and_then(SortKey::parse)
        .unwrap_or(SortKey::PriceAsc);

    let results = listings.browse(&coarse, &filters, sort).await?;
    println!(
        "\nBrowse results ({}, city {})",
        sort.label(),
        city.as_deref().unwrap_or("any")
    );
    for listing in &results {
        println!(
            "- {} | {} | {} {} | {:.0} EUR",
            listing.id,
            listing.title,
            listing.location.city,
            listing.kind.label(),
            listing.price
        );
    }

    let favorites = FavoritesService::new(
        buyer_account.id.clone(),
        Arc::new(InMemoryFavoriteStore::default()),
    );
    if let Some(first) = results.first() {
        favorites
            .toggle(&first.id)
            .await?;
        println!(
            "\nFavorites: {} saved {} -> is_favorite {}",
            buyer_account.display_name,
            first.id,
            favorites.is_favorite(&first.id)
        );
    }

    if skip_messaging {
        return Ok(());
    }

    let messaging = Arc::new(MessagingService::new(Arc::new(
        InMemoryMessagingStore::default(),
    )));
    let notifications = NotificationService::new(Arc::new(InMemoryNotificationStore::default()));

    if let Some(first) = results.first() {
        let conversation = messaging
            .find_or_create(
                &buyer_account.id,
                &owner.id,
                ConversationSeed {
                    listing_id: first.id.clone(),
                    listing_title: first.title.clone(),
                    listing_image: first.images.first().cloned(),
                },
            )
            .await?;

        let mut thread = messaging.watch_messages(&conversation.id).await?;

        messaging
            .send(&conversation.id, &buyer_account.id, "Is it still available?")
            .await?;
        notifications
            .notify(
                &owner.id,
                NotificationKind::Message,
                "New message",
                "Karim asked about your listing",
                Some(conversation.id.0.clone()),
            )
            .await?;
        messaging
            .send(&conversation.id, &owner.id, "Yes, visits start Saturday.")
            .await?;

        println!("\nConversation {} about {}", conversation.id, first.title);
        for message in thread.next().await.unwrap_or_default() {
            println!("- {}: {}", message.sender_id, message.text);
        }

        let refreshed = messaging
            .conversations_for(&owner.id)
            .await?
            .into_iter()
            .next();
        if let Some(inbox_entry) = refreshed {
            println!(
                "Owner unread before reading: {}",
                inbox_entry.unread_for(&owner.id)
            );
        }
        messaging.mark_read(&conversation.id, &owner.id).await?;
        let after = messaging
            .conversations_for(&owner.id)
            .await?
            .into_iter()
            .next();
        if let Some(inbox_entry) = after {
            println!(
                "Owner unread after reading: {}",
                inbox_entry.unread_for(&owner.id)
            );
        }

        let unread_notifications = notifications
            .unread_count(&owner.id)
            .await?;
        println!("Owner unread notifications: {unread_notifications}");
    }

    Ok(())
}
