//! Loads sample listings into an empty database.

use chrono::Utc;
use marketplace::models::{Property, PropertyType};
use marketplace::{AppConfig, AppState};
use uuid::Uuid;

struct Sample {
    title: &'static str,
    property_type: PropertyType,
    price: i64,
    location: &'static str,
    bedrooms: i32,
    bathrooms: i32,
    area: i64,
    image: &'static str,
    owner_name: &'static str,
    owner_contact: &'static str,
    is_rent: bool,
}

const SAMPLES: &[Sample] = &[
    Sample {
        title: "Sunshine Apartments",
        property_type: PropertyType::Flat,
        price: 4_500_000,
        location: "Hyderabad",
        bedrooms: 3,
        bathrooms: 2,
        area: 1200,
        image: "https://images.unsplash.com/photo-1600607687920-4e2a07f94428?auto=format&fit=crop&w=1200&q=80",
        owner_name: "Rahul Sharma",
        owner_contact: "9876543210",
        is_rent: false,
    },
    Sample {
        title: "Green View Residency",
        property_type: PropertyType::Flat,
        price: 3_800_000,
        location: "Bangalore",
        bedrooms: 2,
        bathrooms: 2,
        area: 950,
        image: "https://images.unsplash.com/photo-1598928506311-c55ded91a20c?auto=format&fit=crop&w=1200&q=80",
        owner_name: "Priya Verma",
        owner_contact: "9876501234",
        is_rent: false,
    },
    Sample {
        title: "Skyline Towers",
        property_type: PropertyType::Flat,
        price: 5_200_000,
        location: "Pune",
        bedrooms: 3,
        bathrooms: 2,
        area: 1300,
        image: "https://images.unsplash.com/photo-1613977257363-707ba9348227?auto=format&fit=crop&w=1200&q=80",
        owner_name: "Arjun Patel",
        owner_contact: "9988776655",
        is_rent: false,
    },
    Sample {
        title: "Lakeview Residency",
        property_type: PropertyType::Flat,
        price: 4_000_000,
        location: "Chennai",
        bedrooms: 2,
        bathrooms: 2,
        area: 1100,
        image: "https://images.unsplash.com/photo-1598300042247-3346a0b69b7a?auto=format&fit=crop&w=1200&q=80",
        owner_name: "Sneha Iyer",
        owner_contact: "9123456780",
        is_rent: false,
    },
    Sample {
        title: "Palm Grove Villa",
        property_type: PropertyType::IndividualHouse,
        price: 12_500_000,
        location: "Goa",
        bedrooms: 4,
        bathrooms: 3,
        area: 2800,
        image: "https://images.unsplash.com/photo-1568605114967-8130f3a36994?auto=format&fit=crop&w=1200&q=80",
        owner_name: "Vikram Rao",
        owner_contact: "9090909090",
        is_rent: false,
    },
    Sample {
        title: "Market Street Shop",
        property_type: PropertyType::Shop,
        price: 35_000,
        location: "Mumbai",
        bedrooms: 0,
        bathrooms: 1,
        area: 400,
        image: "https://images.unsplash.com/photo-1441986300917-64674bd600d8?auto=format&fit=crop&w=1200&q=80",
        owner_name: "Meera Joshi",
        owner_contact: "9812345670",
        is_rent: true,
    },
];

impl Sample {
    fn to_property(&self) -> Property {
        Property {
            id: Uuid::new_v4().to_string(),
            title: self.title.to_string(),
            property_type: self.property_type,
            price: self.price,
            location: self.location.to_string(),
            bedrooms: self.bedrooms,
            bathrooms: self.bathrooms,
            area: self.area,
            status: "available".to_string(),
            images: vec![self.image.to_string()],
            owner_name: self.owner_name.to_string(),
            owner_contact: self.owner_contact.to_string(),
            is_rent: self.is_rent,
            created_at: Utc::now().naive_utc(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let state = AppState::new(AppConfig::load()?)?;
    let existing = state.listings.count().await?;
    if existing > 0 {
        log::info!("Database already holds {} properties; nothing to seed", existing);
        return Ok(());
    }

    let inserted = state
        .listings
        .insert_all(SAMPLES.iter().map(Sample::to_property).collect())
        .await?;
    log::info!("Seeded {} sample properties", inserted);
    Ok(())
}
