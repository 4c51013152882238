use std::collections::VecDeque;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::Request;
use rand::RngCore;
use ssample::reservoir::{Entry, ReservoirSampler, SharedReservoir};
use ssample::serve::router;
use ssample::sink::Tee;
use ssample::termination::{InterruptSignal, StopReason, Termination};
use ssample::{sample_stream, Snapshot};
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tower::ServiceExt;

/// Plays back a fixed list of words, then `u64::MAX` forever.
///
/// Each admission decision and each eviction slot draws one word: `0`
/// accepts / picks slot 0, `u64::MAX` rejects / picks the last slot of two.
struct ScriptedRng(VecDeque<u64>);

impl ScriptedRng {
    fn new(script: &[u64]) -> Self {
        Self(script.iter().copied().collect())
    }
}

impl RngCore for ScriptedRng {
    fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        self.0.pop_front().unwrap_or(u64::MAX)
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        for chunk in dst.chunks_mut(8) {
            let word = self.next_u64().to_le_bytes();
            chunk.copy_from_slice(&word[..chunk.len()]);
        }
    }
}

fn scripted(capacity: usize, script: &[u64]) -> SharedReservoir<ScriptedRng> {
    SharedReservoir::from_sampler(ReservoirSampler::with_rng(
        capacity,
        ScriptedRng::new(script),
    ))
}

async fn run_to_end(input: &'static [u8], reservoir: SharedReservoir<ScriptedRng>) -> Snapshot {
    let termination = Termination::new();
    let snapshot = tokio::time::timeout(
        Duration::from_secs(5),
        sample_stream(input, reservoir, Tee::new(), termination.clone(), None),
    )
    .await
    .expect("stream ends");
    assert_eq!(termination.reason(), Some(StopReason::InputExhausted));
    snapshot
}

#[tokio::test]
async fn rejecting_everything_keeps_the_first_k() {
    let snapshot = run_to_end(b"a\nb\nc\nd\ne\n", scripted(3, &[])).await;
    assert_eq!(
        snapshot.entries(),
        &[Entry::new(0, "a"), Entry::new(1, "b"), Entry::new(2, "c")]
    );
    assert_eq!(snapshot.seen(), 5);
}

#[tokio::test]
async fn accepting_into_slot_zero_replaces_the_oldest() {
    let snapshot = run_to_end(b"x\ny\nz\n", scripted(2, &[0, 0])).await;
    assert_eq!(
        snapshot.entries(),
        &[Entry::new(1, "y"), Entry::new(2, "z")]
    );

    let mut out = Vec::new();
    snapshot.write_numbered(&mut out).expect("write");
    assert_eq!(out, b"1\ty\n2\tz\n");
}

/// Leaves `(5, "foo")` in slot 0 and `(2, "bar")` in slot 1.
fn foo_bar_reservoir() -> SharedReservoir<ScriptedRng> {
    let reservoir = scripted(2, &[0, u64::MAX, u64::MAX, u64::MAX, 0, 0]);
    for line in ["a", "b", "bar", "c", "d", "foo"] {
        reservoir.admit(line);
    }
    reservoir
}

async fn pull(reservoir: SharedReservoir<ScriptedRng>, uri: &str) -> String {
    let response = router(reservoir)
        .oneshot(Request::get(uri).body(Body::empty()).expect("request"))
        .await
        .expect("infallible");
    assert!(response.status().is_success());
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    String::from_utf8(body.to_vec()).expect("utf8")
}

#[tokio::test]
async fn plain_pull_is_stream_ordered() {
    assert_eq!(pull(foo_bar_reservoir(), "/?p=1").await, "bar\nfoo\n");
}

#[tokio::test]
async fn numbered_pull_is_stream_ordered() {
    assert_eq!(pull(foo_bar_reservoir(), "/?t=1").await, "2\tbar\n5\tfoo\n");
}

#[tokio::test]
async fn json_pull_reports_seen() {
    let body = pull(foo_bar_reservoir(), "/").await;
    let value: serde_json::Value = serde_json::from_str(&body).expect("json");
    assert_eq!(
        value,
        serde_json::json!({"lines": ["bar", "foo"], "lineNumbers": [2, 5], "seen": 6})
    );
}

async fn wait_for_seen<R: rand::Rng>(reservoir: &SharedReservoir<R>, seen: u64) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while reservoir.seen_count() < seen {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("records admitted");
}

#[tokio::test]
async fn interrupt_keeps_only_records_read_before_it() {
    let (mut writer, reader) = tokio::io::duplex(64);
    let reservoir = scripted(10, &[]);
    let termination = Termination::new();

    let run = tokio::spawn(sample_stream(
        BufReader::new(reader),
        reservoir.clone(),
        Tee::new(),
        termination.clone(),
        None,
    ));

    writer.write_all(b"a\nb\n").await.expect("write");
    wait_for_seen(&reservoir, 2).await;

    assert!(termination.trigger(StopReason::Interrupted(InterruptSignal::Interrupt)));
    let _ = writer.write_all(b"c\nd\n").await;

    let snapshot = tokio::time::timeout(Duration::from_secs(5), run)
        .await
        .expect("run stops")
        .expect("run task");

    assert_eq!(snapshot.entries(), &[Entry::new(0, "a"), Entry::new(1, "b")]);
    assert_eq!(snapshot.seen(), 2);
    assert_eq!(
        termination.reason(),
        Some(StopReason::Interrupted(InterruptSignal::Interrupt))
    );
}

#[tokio::test]
async fn live_sample_is_served_while_streaming() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let (mut writer, reader) = tokio::io::duplex(64);
    let reservoir = scripted(10, &[]);

    let run = tokio::spawn(sample_stream(
        BufReader::new(reader),
        reservoir.clone(),
        Tee::new(),
        Termination::new(),
        Some(listener),
    ));

    writer.write_all(b"first\nsecond\n").await.expect("write");
    wait_for_seen(&reservoir, 2).await;

    let mut stream = TcpStream::connect(addr).await.expect("connect");
    stream
        .write_all(b"GET /?t=1 HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .expect("send request");
    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .await
        .expect("read response");

    assert!(response.starts_with("HTTP/1.1 200"), "{response}");
    assert!(response.ends_with("0\tfirst\n1\tsecond\n"), "{response}");

    drop(writer);
    let snapshot = tokio::time::timeout(Duration::from_secs(5), run)
        .await
        .expect("run stops")
        .expect("run task");
    assert_eq!(snapshot.len(), 2);
}
