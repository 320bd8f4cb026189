//! Scrape → store → send, against in-process fakes.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use posting_bot::models::{ChannelResponse, Posting, SourceConfig, SourceKind};
use posting_bot::pipeline::{ingest_pages, run_send};
use posting_bot::services::delivery::{
    DeliveryEngine, FailureLog, MessageChannel, ParseMode, RetryPolicy, Sleeper,
};
use posting_bot::storage::{JsonFileStore, MemoryStore, PostingStore};
use posting_bot::utils::url::normalize_id;

struct FakeChannel {
    accept: bool,
    sent: Mutex<Vec<String>>,
}

impl FakeChannel {
    fn new(accept: bool) -> Arc<Self> {
        Arc::new(Self {
            accept,
            sent: Mutex::new(Vec::new()),
        })
    }

    fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageChannel for FakeChannel {
    async fn post_message(&self, text: &str, _mode: ParseMode) -> ChannelResponse {
        self.sent.lock().unwrap().push(text.to_string());
        if self.accept {
            ChannelResponse::accepted(200, r#"{"ok":true}"#)
        } else {
            ChannelResponse::rejected(
                500,
                r#"{"ok":false,"error_code":500,"description":"Internal Server Error"}"#,
            )
        }
    }
}

#[derive(Default)]
struct RecordingSleeper {
    slept: Mutex<Vec<Duration>>,
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.slept.lock().unwrap().push(duration);
    }
}

fn engine(
    channel: Arc<FakeChannel>,
    tmp: &TempDir,
    sleeper: Arc<RecordingSleeper>,
) -> DeliveryEngine {
    DeliveryEngine::new(
        channel,
        FailureLog::new(tmp.path().join("send_failures.log")),
        RetryPolicy {
            max_retries: 3,
            backoff_base: 1,
        },
    )
    .with_sleeper(sleeper)
}

fn mercadolibre_card(href: &str, title: &str) -> String {
    format!(
        r#"<div class="andes-card">
            <a class="poly-component__title" href="{href}">{title}</a>
            <span class="andes-money-amount__fraction">300.000</span>
            <ul class="poly-attributes_list"><li>2 ambientes</li></ul>
            <span class="poly-component__location">Palermo</span>
        </div>"#
    )
}

fn source() -> SourceConfig {
    SourceConfig {
        kind: SourceKind::MercadoLibre,
        url: "https://inmuebles.mercadolibre.com.ar/departamentos/alquiler".into(),
    }
}

#[tokio::test]
async fn test_same_listing_from_two_pages_is_delivered_once() {
    let tmp = TempDir::new().unwrap();
    let store = JsonFileStore::open(tmp.path().join("postings.json"))
        .await
        .unwrap();

    let pages = vec![
        (
            source(),
            Ok(mercadolibre_card("https://site/a?x=1", "Depto & balcón")),
        ),
        (
            source(),
            Ok(mercadolibre_card("https://SITE/a/", "Depto (repetido)")),
        ),
    ];
    let stats = ingest_pages(&store, pages).await.unwrap();
    assert_eq!(stats.inserted, 1);

    let channel = FakeChannel::new(true);
    let sleeper = Arc::new(RecordingSleeper::default());
    let engine = engine(channel.clone(), &tmp, sleeper.clone());

    let sent = run_send(&store, &engine).await.unwrap();
    assert_eq!(sent.delivered, 1);

    let messages = channel.sent();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("<b>Depto &amp; balcón</b>"));
    assert!(messages[0].contains("💰<i>$ 300.000</i>"));

    // A second run finds nothing to do, even after reopening the file
    let reopened = JsonFileStore::open(tmp.path().join("postings.json"))
        .await
        .unwrap();
    let posting = reopened
        .get_by_id(&normalize_id("https://site/a"))
        .await
        .unwrap()
        .unwrap();
    assert!(posting.sent);

    let again = run_send(&reopened, &engine).await.unwrap();
    assert_eq!(again.pending, 0);
    assert_eq!(channel.sent().len(), 1);
    assert!(sleeper.slept.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_exhausted_posting_stays_unsent_with_three_failure_records() {
    let tmp = TempDir::new().unwrap();
    let posting = Posting::new("https://www.zonaprop.com.ar/p/1.html", "Depto", "", "", "");
    let id = posting.id.clone();
    let store = MemoryStore::with_postings([posting]);

    let channel = FakeChannel::new(false);
    let sleeper = Arc::new(RecordingSleeper::default());
    let engine = engine(channel.clone(), &tmp, sleeper.clone());

    let stats = run_send(&store, &engine).await.unwrap();
    assert_eq!(stats.exhausted, 1);

    let stored = store.get_by_id(&id).await.unwrap().unwrap();
    assert!(!stored.sent);

    let records = engine.failure_log().lines().await.unwrap();
    assert_eq!(records.len(), 3);
    assert!(records.iter().all(|line| line.contains(&id)));

    // primary + degraded on each of the three attempts
    assert_eq!(channel.sent().len(), 6);
    assert_eq!(
        *sleeper.slept.lock().unwrap(),
        vec![Duration::from_secs(1), Duration::from_secs(2)]
    );
}
