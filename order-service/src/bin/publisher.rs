//! order-publisher: publishes random orders to the inbound topic
//!
//! Development helper for driving the service end to end. `--malformed`
//! publishes an undecodable payload to exercise the dead-letter path.

use std::time::Duration;

use chrono::Utc;
use clap::Parser;
use rand::Rng;
use rand::seq::SliceRandom;
use rdkafka::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use shared::models::{Delivery, Item, Order, Payment};
use uuid::Uuid;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Parser)]
#[command(name = "order-publisher")]
#[command(about = "Publish random orders to Kafka", long_about = None)]
struct Cli {
    /// Kafka bootstrap servers
    #[arg(long, env = "KAFKA_BROKERS", default_value = "localhost:9092")]
    brokers: String,

    /// Destination topic
    #[arg(long, env = "KAFKA_TOPIC", default_value = "orders")]
    topic: String,

    /// Number of messages to publish
    #[arg(long, default_value_t = 1)]
    count: u32,

    /// Publish a payload that is not a valid order
    #[arg(long)]
    malformed: bool,
}

const PROVIDERS: &[&str] = &["wbpay", "stripe", "paypal", "yoomoney", "tinkoff", "sberbank"];
const BANKS: &[&str] = &["alpha", "sber", "tinkoff", "vtb", "gazprom", "raiffeisen"];
const PRODUCTS: &[&str] = &[
    "Mascaras", "Lipstick", "Foundation", "Eyeshadow", "Blush", "Concealer", "Highlighter",
    "Bronzer", "Setting Spray", "Makeup Brushes", "Skincare Set", "Perfume", "Shampoo",
    "Conditioner", "Hair Mask", "Face Cream", "Serum", "Toner", "Cleanser", "Sunscreen",
];
const BRANDS: &[&str] = &[
    "Vivienne Sabo", "L'Oreal", "Maybelline", "MAC", "NYX", "Estee Lauder", "Clinique", "Chanel",
    "Dior", "YSL", "NARS", "Urban Decay", "Too Faced", "Fenty Beauty", "Huda Beauty", "Revlon",
    "Max Factor", "Bourjois", "Lancome", "Guerlain",
];
const SIZES: &[&str] = &["0", "XS", "S", "M", "L", "XL", "XXL", "36", "38", "40", "42", "44"];
const ITEM_STATUSES: &[i32] = &[200, 201, 202, 300, 301, 400, 404, 500];
const LOCALES: &[&str] = &["en", "ru", "de", "fr", "es", "it", "zh", "ja", "ko"];
const CUSTOMER_PREFIXES: &[&str] = &["user", "customer", "client", "buyer"];
const DELIVERY_SERVICES: &[&str] = &["meest", "russianpost", "dhl", "fedex", "ups", "cdek", "boxberry"];
const NAMES: &[&str] = &["Ivan Petrov", "Anna Smirnova", "Test Testov", "Maria Ivanova"];
const CITIES: &[(&str, &str)] = &[
    ("Moscow", "Moscow"),
    ("Kazan", "Tatarstan"),
    ("Kiryat Mozkin", "Kraiot"),
    ("Novosibirsk", "Novosibirsk Oblast"),
];
const STREETS: &[&str] = &["Ploshad Mira", "Lenina", "Tverskaya", "Sadovaya"];

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "order_publisher=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let producer: FutureProducer = ClientConfig::new()
        .set("bootstrap.servers", &cli.brokers)
        .set("message.timeout.ms", "5000")
        .create()?;

    for _ in 0..cli.count {
        let (key, payload) = if cli.malformed {
            (Uuid::new_v4().to_string(), malformed_payload())
        } else {
            let order = random_order();
            (order.order_uid.clone(), serde_json::to_vec_pretty(&order)?)
        };

        let record = FutureRecord::to(&cli.topic).key(&key).payload(&payload);
        match producer.send(record, Duration::from_secs(5)).await {
            Ok((partition, offset)) => {
                tracing::info!(topic = %cli.topic, key = %key, partition, offset, "Message delivered");
            }
            Err((e, _)) => {
                tracing::error!(topic = %cli.topic, key = %key, error = %e, "Delivery failed");
                return Err(e.into());
            }
        }
    }

    Ok(())
}

fn malformed_payload() -> Vec<u8> {
    br#"{"order_uid": 42, "track_number": ["not", "a", "string"]"#.to_vec()
}

fn pick<T: Copy>(rng: &mut impl Rng, values: &[T]) -> T {
    // Every list above is non-empty
    *values.choose(rng).unwrap_or(&values[0])
}

fn digits(rng: &mut impl Rng, n: usize) -> String {
    (0..n)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

/// Structurally valid order: payment keyed by the order id, 1-5 items on the
/// order's track number.
fn random_order() -> Order {
    let mut rng = rand::thread_rng();
    let now = Utc::now();

    let order_uid = Uuid::new_v4().to_string();
    let track_number = format!("WBILM{}", &Uuid::new_v4().simple().to_string()[..8]);
    let item_count = rng.gen_range(1..=5);
    let items = (0..item_count)
        .map(|_| random_item(&mut rng, &track_number))
        .collect();

    let amount: i64 = rng.gen_range(1000..21000);
    let delivery_cost: i64 = rng.gen_range(500..5500);
    let mut goods_total = amount - delivery_cost;
    if goods_total < 100 {
        goods_total = amount - 500;
    }

    let (city, region) = pick(&mut rng, CITIES);
    let name = pick(&mut rng, NAMES);

    Order {
        order_uid: order_uid.clone(),
        track_number: track_number.clone(),
        entry: "WBIL".to_string(),
        delivery: Delivery {
            order_uid: String::new(),
            name: name.to_string(),
            phone: format!("+7{}", digits(&mut rng, 10)),
            zip: digits(&mut rng, 6),
            city: city.to_string(),
            address: format!("{}, {}", pick(&mut rng, STREETS), rng.gen_range(1..100)),
            region: region.to_string(),
            email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
        },
        payment: Payment {
            transaction: order_uid,
            request_id: Uuid::new_v4().to_string(),
            currency: "RUB".to_string(),
            provider: pick(&mut rng, PROVIDERS).to_string(),
            amount,
            payment_dt: now.timestamp() - rng.gen_range(0..3600),
            bank: pick(&mut rng, BANKS).to_string(),
            delivery_cost,
            goods_total,
            custom_fee: rng.gen_range(0..100),
        },
        items,
        locale: pick(&mut rng, LOCALES).to_string(),
        internal_signature: String::new(),
        customer_id: format!("{}_{}", pick(&mut rng, CUSTOMER_PREFIXES), digits(&mut rng, 6)),
        delivery_service: pick(&mut rng, DELIVERY_SERVICES).to_string(),
        shardkey: rng.gen_range(0..10).to_string(),
        sm_id: rng.gen_range(1..=100),
        date_created: now,
        oof_shard: rng.gen_range(1..=3).to_string(),
    }
}

fn random_item(rng: &mut impl Rng, track_number: &str) -> Item {
    let price: i64 = rng.gen_range(100..5100);
    let quantity: i64 = rng.gen_range(1..=5);
    let sale: i32 = rng.gen_range(0..50);

    Item {
        chrt_id: rng.gen_range(0..10_000_000),
        track_number: track_number.to_string(),
        price,
        rid: Uuid::new_v4().to_string(),
        name: pick(rng, PRODUCTS).to_string(),
        sale,
        size: pick(rng, SIZES).to_string(),
        total_price: price * quantity * (100 - i64::from(sale)) / 100,
        nm_id: rng.gen_range(0..3_000_000),
        brand: pick(rng, BRANDS).to_string(),
        status: pick(rng, ITEM_STATUSES),
    }
}
