use futures::StreamExt;
use json_patch::Patch;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

use crate::stream_msg::StreamMsg;

const CHANNEL_CAPACITY: usize = 4096;

/// Fan-out point for realtime messages. Nothing is retained: subscribers
/// see what is pushed after they subscribe.
pub struct MsgStore {
    sender: broadcast::Sender<StreamMsg>,
}

impl Default for MsgStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MsgStore {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn push(&self, msg: StreamMsg) {
        // No subscribers is not an error.
        let _ = self.sender.send(msg);
    }

    pub fn push_patch(&self, patch: Patch) {
        self.push(StreamMsg::JsonPatch(patch));
    }

    pub fn get_receiver(&self) -> broadcast::Receiver<StreamMsg> {
        self.sender.subscribe()
    }

    /// Messages pushed after the call. Lagged receivers skip what they missed.
    pub fn live_stream(
        &self,
    ) -> futures::stream::BoxStream<'static, Result<StreamMsg, std::io::Error>> {
        BroadcastStream::new(self.get_receiver())
            .filter_map(|res| async move { res.ok().map(Ok::<_, std::io::Error>) })
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures::StreamExt;
    use serde_json::json;

    use super::*;

    fn add_patch(path: &str) -> Patch {
        serde_json::from_value(json!([{ "op": "add", "path": path, "value": 1 }])).unwrap()
    }

    fn path_of(msg: StreamMsg) -> String {
        let StreamMsg::JsonPatch(patch) = msg;
        serde_json::to_value(&patch).unwrap()[0]["path"]
            .as_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn live_stream_only_sees_later_messages() {
        let store = MsgStore::new();
        store.push_patch(add_patch("/old"));

        let mut first = store.live_stream();
        let mut second = store.live_stream();
        store.push_patch(add_patch("/new"));

        assert_eq!(path_of(first.next().await.unwrap().unwrap()), "/new");
        assert_eq!(path_of(second.next().await.unwrap().unwrap()), "/new");
        assert!(
            tokio::time::timeout(Duration::from_millis(50), first.next())
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn lagged_subscriber_resumes_with_newest_messages() {
        let store = MsgStore::new();
        let mut stream = store.live_stream();
        for i in 0..(CHANNEL_CAPACITY + 10) {
            store.push_patch(add_patch(&format!("/{i}")));
        }

        assert_eq!(path_of(stream.next().await.unwrap().unwrap()), "/10");
    }
}
