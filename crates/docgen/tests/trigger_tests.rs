use docgen::{DocService, FileEvent, MemoryHost};
use domain::{ConfigHandle, DocConfig, FileRef, NodeId, NodeSnapshot};

fn host() -> MemoryHost {
    let mut host = MemoryHost::new(FileRef::java("/tmp/docgen-none/Event.java"));
    let class = host.add_root(NodeSnapshot::new(NodeId(0), "class", "Event"));
    let field = host.add_child(class, NodeSnapshot::new(NodeId(0), "field", "id"));
    host.attach_comment(field, "/** Kept. */");
    host
}

#[tokio::test]
async fn test_disabled_listener_is_a_no_op() {
    let service = DocService::new(ConfigHandle::new(DocConfig::default()));
    let mut host = host();

    let report = service
        .triggers()
        .dispatch(FileEvent::BeforeSave, &mut host)
        .await
        .unwrap();

    assert!(report.is_none());
    assert_eq!(host.write_scopes(), 0);
}

#[tokio::test]
async fn test_save_event_generates_without_overwriting() {
    let handle = ConfigHandle::new(DocConfig::default());
    handle.update(|c| c.listeners.save_enabled = true);
    let service = DocService::new(handle);
    let mut host = host();

    let report = service
        .triggers()
        .dispatch(FileEvent::BeforeSave, &mut host)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(report.generated, 1);
    let field = host.find("id").unwrap();
    assert_eq!(host.comment_of(field), Some("/** Kept. */"));
}

#[tokio::test]
async fn test_toggles_are_independent_and_read_at_dispatch() {
    let handle = ConfigHandle::new(DocConfig::default());
    let service = DocService::new(handle.clone());
    let triggers = service.triggers();
    let mut host = host();

    handle.update(|c| c.listeners.create_enabled = true);
    assert!(triggers.is_enabled(FileEvent::Created));
    assert!(!triggers.is_enabled(FileEvent::BeforeSave));

    let report = triggers.dispatch(FileEvent::Created, &mut host).await.unwrap();
    assert!(report.is_some());
}

#[test]
fn test_event_names_parse() {
    assert_eq!("before-save".parse::<FileEvent>().unwrap(), FileEvent::BeforeSave);
    assert_eq!("Created".parse::<FileEvent>().unwrap(), FileEvent::Created);
    assert!("deleted".parse::<FileEvent>().is_err());
}
