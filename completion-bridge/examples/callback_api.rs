use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use completion_bridge::{bridge, Bridge, BridgeConfig, BridgeError, Checked, RecordingSink};

/// A toy key-value store with a completion handler API.
#[derive(Clone, Default)]
struct Store {
    data: Arc<Mutex<HashMap<String, u64>>>,
}

impl Store {
    fn put(&self, key: &str, value: u64, on_complete: impl FnOnce(Result<(), String>) + Send + 'static) {
        let data = self.data.clone();
        let key = key.to_owned();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(5));
            data.lock().unwrap().insert(key, value);
            on_complete(Ok(()))
        });
    }

    fn get(&self, key: &str, on_complete: impl FnOnce(Option<u64>, Option<String>) + Send + 'static) {
        let data = self.data.clone();
        let key = key.to_owned();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(5));
            match data.lock().unwrap().get(&key) {
                Some(value) => on_complete(Some(*value), None),
                None => on_complete(None, Some(format!("no such key: {}", key))),
            }
        });
    }
}

fn main() {
    let store = Store::default();

    // wait on a completion handler from an async context
    futures_executor::block_on(async {
        let put: Bridge<(), String> = bridge(|resumer| {
            store.put("visits", 3, move |result| {
                resumer.resume(result);
            })
        });
        put.await.unwrap();

        let get: Bridge<u64, String> = bridge(|resumer| {
            store.get("visits", resumer.optional_handler());
        });
        println!("visits: {}", get.await.unwrap());
    });

    // or block the current thread
    let missing: Bridge<u64, String> = bridge(|resumer| {
        store.get("likes", resumer.optional_handler());
    });
    match missing.wait() {
        Err(BridgeError::Failed(err)) => println!("lookup failed: {}", err),
        other => println!("unexpected: {:?}", other),
    }

    // a misbehaving API which calls its handler twice
    let sink = Arc::new(RecordingSink::new());
    let twice: Bridge<u64, String, Checked> = BridgeConfig::new()
        .label("twice")
        .shared_sink(sink.clone())
        .bridge(|resumer| {
            let handler = resumer.handler();
            handler(Ok(1));
            handler(Ok(2));
        });
    println!("delivered: {:?}", twice.wait());
    for event in sink.take() {
        println!("misuse in {}: {}", event.label, event.kind);
    }
}
