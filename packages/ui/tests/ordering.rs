//! Ordering of in-flight flows against a gateway whose calls can be held open.

use std::sync::Arc;

use api::{Collection, Gateway, GatewayCall, GatewayFailure, MemoryGateway, RecordKey, Todo, User, UserId};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Notify;
use ui::{Coordinator, MutationOutcome};

/// Delegates to a [`MemoryGateway`] once `release` has been notified.
///
/// The inner call is made (and recorded) only after release, so `calls()`
/// reflects what has resolved; `issued` counts what has been started.
#[derive(Clone)]
struct HeldGateway {
    inner: MemoryGateway,
    release: Arc<Notify>,
    issued: Arc<std::sync::Mutex<Vec<GatewayCall>>>,
}

impl HeldGateway {
    fn new(inner: MemoryGateway) -> Self {
        Self {
            inner,
            release: Arc::new(Notify::new()),
            issued: Arc::default(),
        }
    }

    fn issued(&self) -> Vec<GatewayCall> {
        self.issued.lock().unwrap().clone()
    }

    async fn hold(&self, call: GatewayCall) {
        self.issued.lock().unwrap().push(call);
        self.release.notified().await;
    }
}

impl Gateway for HeldGateway {
    async fn fetch_all<T: DeserializeOwned>(
        &self,
        collection: Collection,
    ) -> Result<Vec<T>, GatewayFailure> {
        self.inner.fetch_all(collection).await
    }

    async fn fetch_by_owner<T: DeserializeOwned>(
        &self,
        collection: Collection,
        owner: UserId,
    ) -> Result<Vec<T>, GatewayFailure> {
        self.inner.fetch_by_owner(collection, owner).await
    }

    async fn update<T: Serialize + DeserializeOwned>(
        &self,
        collection: Collection,
        id: u64,
        record: &T,
    ) -> Result<T, GatewayFailure> {
        self.hold(GatewayCall::Update(collection, id)).await;
        self.inner.update(collection, id, record).await
    }

    async fn delete(&self, collection: Collection, id: u64) -> Result<(), GatewayFailure> {
        self.hold(GatewayCall::Delete(collection, id)).await;
        self.inner.delete(collection, id).await
    }
}

fn backend() -> MemoryGateway {
    let gateway = MemoryGateway::new();
    gateway.seed(
        Collection::Users,
        &[
            User::new(1, "Leanne Graham", "Sincere@april.biz"),
            User::new(2, "Ervin Howell", "Shanna@melissa.tv"),
        ],
    )
    .unwrap();
    gateway.seed(
        Collection::Todos,
        &[
            Todo {
                id: RecordKey::Identified(1),
                user_id: 1,
                title: "delectus aut autem".into(),
                completed: false,
            },
            Todo {
                id: RecordKey::Identified(2),
                user_id: 1,
                title: "quis ut nam facilis".into(),
                completed: false,
            },
        ],
    )
    .unwrap();
    gateway
}

#[tokio::test]
async fn delete_user_removes_only_after_the_call_resolves() {
    let gateway = HeldGateway::new(backend());
    let coordinator = Coordinator::new(gateway.clone());
    coordinator.load_all().await.unwrap();

    let delete = coordinator.delete_user(1);
    let observe = async {
        // Let the delete reach the gateway and park there
        while gateway.issued().is_empty() {
            tokio::task::yield_now().await;
        }
        assert_eq!(gateway.issued(), vec![GatewayCall::Delete(Collection::Users, 1)]);
        assert_eq!(coordinator.render().visible_ids(), vec![1, 2]);
        gateway.release.notify_one();
    };

    let (outcome, ()) = tokio::join!(delete, observe);
    assert!(outcome.is_confirmed());
    assert_eq!(coordinator.render().visible_ids(), vec![2]);

    let deletes: Vec<_> = gateway
        .inner
        .calls()
        .into_iter()
        .filter(|call| matches!(call, GatewayCall::Delete(..)))
        .collect();
    assert_eq!(deletes, vec![GatewayCall::Delete(Collection::Users, 1)]);
}

#[tokio::test]
async fn concurrent_completions_are_not_serialized() {
    let gateway = HeldGateway::new(backend());
    let coordinator = Coordinator::new(gateway.clone());
    coordinator.load_all().await.unwrap();

    let first = coordinator.mark_todo_completed(1, RecordKey::Identified(1));
    let second = coordinator.mark_todo_completed(1, RecordKey::Identified(2));

    // Both applied already, neither confirmed
    assert!(coordinator.with_store(|s| s.is_fully_complete(1)));

    let release = async {
        while gateway.issued().len() < 2 {
            tokio::task::yield_now().await;
        }
        gateway.release.notify_waiters();
    };

    let (first, second, ()) = tokio::join!(first, second, release);
    assert!(first.is_confirmed());
    assert!(second.is_confirmed());
    assert!(coordinator.with_store(|s| s.is_fully_complete(1)));
}

#[tokio::test]
async fn failed_delete_while_held_keeps_the_user() {
    let backend = backend();
    let gateway = HeldGateway::new(backend.clone());
    let coordinator = Coordinator::new(gateway.clone());
    coordinator.load_users().await.unwrap();
    backend.set_failing(true);

    let delete = coordinator.delete_user(2);
    let release = async {
        while gateway.issued().is_empty() {
            tokio::task::yield_now().await;
        }
        gateway.release.notify_one();
    };

    let (outcome, ()) = tokio::join!(delete, release);
    assert!(matches!(outcome, MutationOutcome::Failed(_)));
    assert_eq!(coordinator.render().visible_ids(), vec![1, 2]);
}
