use netns_attrs::{
    AccessClass, Directory, HierarchyConfig, LocalNamespaceManager, NetnsError, NetnsModule,
    Viewer,
};
use std::sync::Arc;
use std::thread;

fn start() -> (Arc<Directory>, Arc<LocalNamespaceManager>, NetnsModule) {
    let kernel = Directory::root("kernel");
    let manager = Arc::new(LocalNamespaceManager::new());
    let module = NetnsModule::start(&HierarchyConfig::default(), &kernel, manager.clone()).unwrap();
    (kernel, manager, module)
}

#[test]
fn test_viewer_sees_only_its_own_node() {
    let (_kernel, manager, module) = start();
    let nets: Vec<_> = ["a", "b", "c"]
        .iter()
        .map(|name| manager.create_namespace(name).unwrap())
        .collect();

    assert_eq!(module.hierarchy().top().child_count(), 3);
    for net in &nets {
        let seen = module.hierarchy().enumerate(&Viewer::owner(net.id()));
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].owning_namespace(), net.id());
        assert_eq!(
            module.hierarchy().list(&Viewer::owner(net.id()), "net").unwrap(),
            vec!["data"]
        );
    }
}

#[test]
fn test_stranger_cannot_reach_foreign_attribute() {
    let (_kernel, manager, module) = start();
    let a = manager.create_namespace("a").unwrap();
    let b = manager.create_namespace("b").unwrap();
    let va = Viewer::owner(a.id());

    module.hierarchy().write_attribute(&va, "net/data/property", "100").unwrap();

    // b writes through its own path and only ever touches its own node.
    let vb = Viewer::owner(b.id());
    module.hierarchy().write_attribute(&vb, "net/data/property", "1").unwrap();
    assert_eq!(module.hierarchy().read_attribute(&va, "net/data/property").unwrap(), "100\n");

    manager.destroy_namespace(b.id()).unwrap();
    assert!(matches!(
        module.hierarchy().write_attribute(&vb, "net/data/property", "2"),
        Err(NetnsError::NotFound { .. })
    ));
}

#[test]
fn test_non_boundary_levels_visible_to_all() {
    let (_kernel, manager, module) = start();
    let a = manager.create_namespace("a").unwrap();
    let b = manager.create_namespace("b").unwrap();

    for net in [&a, &b] {
        assert_eq!(module.hierarchy().list(&Viewer::owner(net.id()), "").unwrap(), vec!["net"]);
    }
}

#[test]
fn test_other_class_reads_but_cannot_write() {
    let (_kernel, manager, module) = start();
    let a = manager.create_namespace("a").unwrap();
    let other = Viewer::new(a.id(), AccessClass::Other);

    assert_eq!(module.hierarchy().read_attribute(&other, "net/data/property").unwrap(), "0\n");
    assert!(matches!(
        module.hierarchy().write_attribute(&other, "net/data/property", "1"),
        Err(NetnsError::PermissionDenied { .. })
    ));
}

#[test]
fn test_snapshot_shows_only_own_namespace() {
    let (_kernel, manager, module) = start();
    let a = manager.create_namespace("a").unwrap();
    manager.create_namespace("b").unwrap();
    let viewer = Viewer::owner(a.id());
    module.hierarchy().write_attribute(&viewer, "net/data/property", "3").unwrap();

    let json = serde_json::to_value(module.hierarchy().snapshot(&viewer)).unwrap();
    assert_eq!(json["name"], "kset_sysfs_netns");
    let net = &json["children"][0];
    assert_eq!(net["name"], "net");
    let children = net["children"].as_array().unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0]["namespace"], a.id().0);
    assert_eq!(children[0]["attributes"][0]["value"], 3);
    assert_eq!(children[0]["attributes"][0]["mode"], "0664");
}

#[test]
fn test_concurrent_namespace_churn() {
    let (kernel, manager, module) = start();
    let probe = module.hierarchy().probe();

    let workers: Vec<_> = (0..8)
        .map(|worker| {
            let manager = Arc::clone(&manager);
            thread::spawn(move || {
                for round in 0..25 {
                    let net = manager
                        .create_namespace(&format!("w{}-{}", worker, round))
                        .unwrap();
                    if round % 2 == 0 {
                        manager.destroy_namespace(net.id()).unwrap();
                    }
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    let live = manager.namespaces();
    assert_eq!(live.len(), 8 * 12);
    assert_eq!(module.hierarchy().top().child_count(), live.len());
    for net in &live {
        assert_eq!(module.hierarchy().enumerate(&Viewer::owner(net.id())).len(), 1);
    }

    module.stop();
    assert!(probe.is_released());
    assert_eq!(kernel.child_count(), 0);
}

#[test]
fn test_concurrent_reads_see_whole_values() {
    let (_kernel, manager, module) = start();
    let a = manager.create_namespace("a").unwrap();
    let node = module.node_for(&a).unwrap();
    let viewer = Viewer::owner(a.id());

    let writer = {
        let node = Arc::clone(&node);
        thread::spawn(move || {
            for _ in 0..1000 {
                node.store(&viewer, "-1").unwrap();
                node.store(&viewer, "2147483647").unwrap();
            }
        })
    };
    for _ in 0..1000 {
        let text = node.show(&viewer).unwrap();
        assert!(text == "-1\n" || text == "2147483647\n" || text == "0\n", "{:?}", text);
    }
    writer.join().unwrap();
}
