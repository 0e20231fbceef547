//! Demo tenant seed script
//!
//! Creates (or reuses) a demo organization with custom terminology and three
//! published opportunities: a one-off event, a weekly shift and a virtual
//! project. Running it twice leaves the data unchanged.
//!
//! Usage:
//!   DATABASE_URL=... ./seed-demo [--tenant demo-org]

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use clap::Parser;
use sqlx::{postgres::PgPoolOptions, types::Json, PgPool};
use uuid::Uuid;

use volunteerhub_api::{
    db,
    models::{
        opportunity::{OpportunityType, Requirements},
        tenant::{DEFAULT_ACCENT_COLOR, DEFAULT_PRIMARY_COLOR},
    },
};

#[derive(Parser)]
#[command(name = "seed-demo", about = "Seed a demo organization with sample opportunities")]
struct Args {
    /// Slug of the demo tenant
    #[arg(long, default_value = "demo-org")]
    tenant: String,
}

struct DemoOpportunity {
    title: &'static str,
    description: &'static str,
    kind: OpportunityType,
    location: Option<&'static str>,
    address: Option<&'static str>,
    is_virtual: bool,
    start_date: DateTime<Utc>,
    end_date: Option<DateTime<Utc>>,
    recurrence: Option<&'static str>,
    capacity: i32,
    tags: &'static [&'static str],
    requirements: Requirements,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = Args::parse();
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL required")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("Failed to connect to database")?;
    db::run_migrations(&pool).await?;

    let tenant_id = upsert_tenant(&pool, &args.tenant).await?;
    tracing::info!(tenant = %args.tenant, "demo tenant ready");

    let mut created = 0;
    for opportunity in demo_opportunities(Utc::now()) {
        if insert_opportunity(&pool, tenant_id, &opportunity).await? {
            created += 1;
        }
    }
    tracing::info!(created, "demo opportunities seeded");

    Ok(())
}

async fn upsert_tenant(pool: &PgPool, slug: &str) -> Result<Uuid> {
    let terminology: BTreeMap<String, String> = [
        ("volunteer", "Helper"),
        ("volunteers", "Helpers"),
        ("opportunity", "Service"),
        ("opportunities", "Services"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    let id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO tenants (slug, name, primary_color, accent_color, terminology)
         VALUES ($1, 'Demo Organization', $2, $3, $4)
         ON CONFLICT (slug) DO UPDATE SET updated_at = NOW()
         RETURNING id",
    )
    .bind(slug)
    .bind(DEFAULT_PRIMARY_COLOR)
    .bind(DEFAULT_ACCENT_COLOR)
    .bind(Json(terminology))
    .fetch_one(pool)
    .await
    .context("Failed to upsert demo tenant")?;
    Ok(id)
}

/// Inserts unless the tenant already has an opportunity with the same title.
async fn insert_opportunity(pool: &PgPool, tenant_id: Uuid, o: &DemoOpportunity) -> Result<bool> {
    let tags: Vec<String> = o.tags.iter().map(|t| t.to_string()).collect();

    let inserted = sqlx::query(
        "INSERT INTO opportunities
           (tenant_id, title, description, type, status, location, address, is_virtual,
            start_date, end_date, recurrence, requirements, capacity, spots_remaining, tags)
         SELECT $1, $2, $3, $4, 'published', $5, $6, $7, $8, $9, $10, $11, $12, $12, $13
         WHERE NOT EXISTS (SELECT 1 FROM opportunities WHERE tenant_id = $1 AND title = $2)",
    )
    .bind(tenant_id)
    .bind(o.title)
    .bind(o.description)
    .bind(o.kind)
    .bind(o.location)
    .bind(o.address)
    .bind(o.is_virtual)
    .bind(o.start_date)
    .bind(o.end_date)
    .bind(o.recurrence)
    .bind(Json(&o.requirements))
    .bind(o.capacity)
    .bind(&tags)
    .execute(pool)
    .await
    .with_context(|| format!("Failed to insert opportunity {}", o.title))?;

    Ok(inserted.rows_affected() == 1)
}

fn demo_opportunities(now: DateTime<Utc>) -> Vec<DemoOpportunity> {
    let tomorrow = now + Duration::days(1);
    let next_week = now + Duration::days(7);

    vec![
        DemoOpportunity {
            title: "Community Garden Cleanup",
            description: "Help us prepare the community garden for spring planting! We'll be clearing debris, turning soil, and setting up new garden beds.",
            kind: OpportunityType::Event,
            location: Some("Community Garden"),
            address: Some("123 Garden Lane, Springfield"),
            is_virtual: false,
            start_date: tomorrow,
            end_date: Some(tomorrow + Duration::hours(3)),
            recurrence: None,
            capacity: 20,
            tags: &["outdoor", "gardening"],
            requirements: Requirements {
                skills: Some(vec!["gardening".into()]),
                min_age: Some(14),
                background_check: None,
            },
        },
        DemoOpportunity {
            title: "Food Bank Weekly Shift",
            description: "Sort and package food donations at our local food bank. This is a recurring weekly shift.",
            kind: OpportunityType::Shift,
            location: Some("Springfield Food Bank"),
            address: Some("456 Helping Hand Ave"),
            is_virtual: false,
            start_date: next_week,
            end_date: Some(next_week + Duration::hours(4)),
            recurrence: Some("weekly"),
            capacity: 10,
            tags: &["food bank", "sorting"],
            requirements: Requirements::default(),
        },
        DemoOpportunity {
            title: "Website Redesign Project",
            description: "Help our nonprofit redesign their website. Looking for volunteers with web development or design skills.",
            kind: OpportunityType::Project,
            location: None,
            address: None,
            is_virtual: true,
            start_date: tomorrow,
            end_date: None,
            recurrence: None,
            capacity: 5,
            tags: &["tech", "design", "remote"],
            requirements: Requirements {
                skills: Some(vec!["web development".into(), "design".into()]),
                min_age: None,
                background_check: None,
            },
        },
    ]
}
