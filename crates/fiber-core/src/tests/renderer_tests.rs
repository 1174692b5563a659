use super::*;
use crate::element::{component, create_element, PropValue, TEXT_VALUE_KEY};
use crate::hooks::use_state;
use crate::memory_host::{HostOp, MemoryHost};
use crate::testing::{StepDeadline, TestRenderer, Unbounded};

fn list(items: &[&str]) -> Element {
    create_element(
        "ul",
        Props::new(),
        items
            .iter()
            .map(|item| create_element("li", Props::new(), vec![(*item).into()]))
            .collect(),
    )
}

fn counter(_: &Props) -> Element {
    let (count, set_count) = use_state(1);
    create_element(
        "h1",
        Props::new().on("click", move |_| set_count.update(|c| c + 1)),
        vec!["Count: ".into(), count.into()],
    )
}

fn label(props: &Props) -> Element {
    let caption = props
        .get("caption")
        .and_then(PropValue::as_str)
        .unwrap_or_default()
        .to_owned();
    create_element("span", Props::new(), vec![caption.into()])
}

fn ul_of(test: &TestRenderer) -> NodeId {
    test.host()
        .find_by_tag(test.container(), "ul")
        .expect("list rendered")
}

fn structural(ops: &[HostOp]) -> Vec<&HostOp> {
    ops.iter().filter(|op| op.is_structural()).collect()
}

#[test]
fn first_render_builds_the_host_tree() {
    let mut test = TestRenderer::new();
    let stats = test
        .render(create_element(
            "div",
            Props::new().with("id", "foo"),
            vec![
                create_element("a", Props::new(), vec!["bar".into()]),
                create_element("b", Props::new(), vec![]),
            ],
        ))
        .expect("render");

    assert_eq!(
        stats,
        CommitStats {
            placements: 4,
            updates: 0,
            deletions: 0
        }
    );
    let host = test.host();
    let div = host.children(test.container())[0];
    assert_eq!(host.property(div, "id"), Some(&PropValue::from("foo")));
    assert_eq!(host.children(div).len(), 2);
    assert_eq!(test.text(), "bar");
}

#[test]
fn identical_rerender_changes_nothing_structural() {
    let mut test = TestRenderer::new();
    let heading = || create_element("h1", Props::new(), vec!["Count: 1".into()]);
    test.render(heading()).expect("first render");
    test.host_mut().take_ops();

    let stats = test.render(heading()).expect("second render");
    assert_eq!(
        stats,
        CommitStats {
            placements: 0,
            updates: 2,
            deletions: 0
        }
    );
    assert!(test.host().ops().is_empty());
}

#[test]
fn reordered_children_are_updated_in_place() {
    let mut test = TestRenderer::new();
    test.render(list(&["A", "B"])).expect("first render");
    let ul = ul_of(&test);
    let before = test.host().children(ul).to_vec();
    test.host_mut().take_ops();

    let stats = test.render(list(&["B", "A"])).expect("second render");
    assert_eq!(stats.placements, 0);
    assert_eq!(stats.deletions, 0);
    assert_eq!(stats.updates, 5);

    let ops = test.host_mut().take_ops();
    assert!(structural(&ops).is_empty());
    let writes: Vec<_> = ops
        .iter()
        .filter_map(|op| match op {
            HostOp::SetProperty { name, value, .. } if name == TEXT_VALUE_KEY => {
                Some(value.to_string())
            }
            _ => None,
        })
        .collect();
    assert_eq!(writes, vec!["B", "A"]);
    assert_eq!(test.host().children(ul), before.as_slice());
    assert_eq!(test.text(), "BA");
}

#[test]
fn shrinking_list_deletes_the_tail_once() {
    let mut test = TestRenderer::new();
    test.render(list(&["X", "Y", "Z"])).expect("first render");
    let ul = ul_of(&test);
    test.host_mut().take_ops();

    let stats = test.render(list(&["X"])).expect("second render");
    assert_eq!(stats.deletions, 2);
    assert_eq!(stats.placements, 0);
    let removals = test
        .host()
        .ops()
        .iter()
        .filter(|op| matches!(op, HostOp::RemoveChild { parent, .. } if *parent == ul))
        .count();
    assert_eq!(removals, 2);
    assert_eq!(test.host().children(ul).len(), 1);
    assert_eq!(test.text(), "X");
}

#[test]
fn growing_list_appends_in_order() {
    let mut test = TestRenderer::new();
    test.render(list(&["X"])).expect("first render");
    let ul = ul_of(&test);
    let first = test.host().children(ul)[0];

    let stats = test.render(list(&["X", "Y"])).expect("second render");
    assert_eq!(stats.deletions, 0);
    assert_eq!(stats.placements, 2);
    let children = test.host().children(ul);
    assert_eq!(children.len(), 2);
    assert_eq!(children[0], first);
    assert_eq!(test.text(), "XY");
}

#[test]
fn type_change_replaces_the_host_node() {
    let mut test = TestRenderer::new();
    test.render(create_element(
        "div",
        Props::new(),
        vec![create_element("p", Props::new(), vec!["old".into()])],
    ))
    .expect("first render");

    let stats = test
        .render(create_element(
            "div",
            Props::new(),
            vec![create_element("span", Props::new(), vec!["new".into()])],
        ))
        .expect("second render");
    assert_eq!(stats.deletions, 1);
    assert_eq!(stats.placements, 2);
    let host = test.host();
    let div = host.children(test.container())[0];
    assert_eq!(host.children(div).len(), 1);
    assert!(host.find_by_tag(div, "p").is_none());
    assert_eq!(test.text(), "new");
}

#[test]
fn changed_props_are_diffed_on_the_existing_node() {
    let mut test = TestRenderer::new();
    test.render(create_element(
        "div",
        Props::new().with("id", "a").with("class", "x"),
        vec![],
    ))
    .expect("first render");
    test.host_mut().take_ops();

    test.render(create_element("div", Props::new().with("id", "b"), vec![]))
        .expect("second render");
    let div = test.host().children(test.container())[0];
    assert_eq!(
        test.host().ops(),
        &[
            HostOp::RemoveProperty {
                id: div,
                name: "class".into()
            },
            HostOp::SetProperty {
                id: div,
                name: "id".into(),
                value: PropValue::from("b")
            },
        ]
    );
}

#[test]
fn state_update_rerenders_with_the_folded_value() {
    let mut test = TestRenderer::new();
    test.render(component(counter, Props::new()))
        .expect("first render");
    assert_eq!(test.text(), "Count: 1");
    let h1 = test
        .host()
        .find_by_tag(test.container(), "h1")
        .expect("heading");
    let number = test.host().children(h1)[1];

    assert_eq!(test.dispatch("h1", "click"), 1);
    assert!(test.renderer().has_pending_work());
    assert_eq!(test.pump_until_idle().expect("pump"), 1);

    assert_eq!(test.text(), "Count: 2");
    assert_eq!(test.host().children(h1)[1], number);
    assert_eq!(
        test.host().property(number, TEXT_VALUE_KEY),
        Some(&PropValue::Int(2))
    );
    assert_eq!(test.host().listener_count(h1, "click"), 1);
}

#[test]
fn batched_updates_fold_in_one_pass() {
    let mut test = TestRenderer::new();
    test.render(component(counter, Props::new()))
        .expect("first render");
    test.dispatch("h1", "click");
    test.dispatch("h1", "click");
    test.dispatch("h1", "click");
    assert_eq!(test.pump_until_idle().expect("pump"), 1);
    assert_eq!(test.text(), "Count: 4");
}

#[test]
fn deleting_a_component_removes_its_host_node() {
    let mut test = TestRenderer::new();
    test.render(create_element(
        "div",
        Props::new(),
        vec![component(label, Props::new().with("caption", "hi"))],
    ))
    .expect("first render");
    let host = test.host();
    let div = host.children(test.container())[0];
    let span = host.find_by_tag(div, "span").expect("label rendered");
    test.host_mut().take_ops();

    let stats = test
        .render(create_element("div", Props::new(), vec![]))
        .expect("second render");
    assert_eq!(stats.deletions, 1);
    assert_eq!(
        structural(test.host().ops()),
        vec![&HostOp::RemoveChild {
            parent: div,
            child: span
        }]
    );
    assert!(test.host().children(div).is_empty());
}

#[test]
fn one_unit_per_slice_needs_one_slice_per_fiber() {
    let mut host = MemoryHost::new();
    let container = host.create_container("root");
    let mut renderer = Renderer::new(host);
    // root, div, two paragraphs and their two text children
    let element = create_element(
        "div",
        Props::new(),
        vec![
            create_element("p", Props::new(), vec!["a".into()]),
            create_element("p", Props::new(), vec!["b".into()]),
        ],
    );
    renderer.render(element, container);

    let mut slices = 0;
    loop {
        slices += 1;
        let status = renderer
            .work_loop(&StepDeadline::new(1))
            .expect("work loop");
        if status == WorkStatus::Committed {
            break;
        }
        assert_eq!(status, WorkStatus::Yielded);
        assert!(renderer.host().children(container).is_empty());
        assert!(renderer.last_commit().is_none());
    }
    assert_eq!(slices, 6);
    assert_eq!(renderer.host().text_content(container), "ab");
    assert_eq!(
        renderer.work_loop(&Unbounded).expect("idle"),
        WorkStatus::Idle
    );
}

#[test]
fn update_during_a_pass_queues_another_pass() {
    let mut test = TestRenderer::new();
    test.render(component(counter, Props::new()))
        .expect("first render");
    test.dispatch("h1", "click");

    // root, then the counter component itself
    for _ in 0..2 {
        let status = test
            .renderer_mut()
            .work_loop(&StepDeadline::new(1))
            .expect("slice");
        assert_eq!(status, WorkStatus::Yielded);
    }
    test.dispatch("h1", "click");
    assert!(test.renderer().is_rendering());

    let mut status = WorkStatus::Yielded;
    while status != WorkStatus::Committed {
        status = test
            .renderer_mut()
            .work_loop(&Unbounded)
            .expect("finish pass");
    }
    assert_eq!(test.text(), "Count: 2");
    assert!(test.renderer().has_pending_work());

    assert_eq!(test.pump_until_idle().expect("pump"), 1);
    assert_eq!(test.text(), "Count: 3");
}

#[test]
fn render_during_a_pass_is_deferred() {
    let mut test = TestRenderer::new();
    let container = test.container();
    test.renderer_mut()
        .render(create_element("p", Props::new(), vec!["one".into()]), container);
    test.renderer_mut()
        .work_loop(&StepDeadline::new(1))
        .expect("slice");
    test.renderer_mut()
        .render(create_element("p", Props::new(), vec!["two".into()]), container);

    assert_eq!(test.pump_until_idle().expect("pump"), 2);
    assert_eq!(test.text(), "two");
}

#[test]
fn committed_trees_are_released() {
    let mut test = TestRenderer::new();
    test.render(component(counter, Props::new()))
        .expect("first render");
    // root, counter, h1 and two text fibers
    assert_eq!(test.renderer().fiber_count(), 5);
    for _ in 0..3 {
        test.dispatch("h1", "click");
        test.pump_until_idle().expect("pump");
    }
    assert_eq!(test.renderer().fiber_count(), 5);
    assert_eq!(test.text(), "Count: 4");
}

#[test]
fn every_slice_requests_the_next_one() {
    let mut test = TestRenderer::new();
    let before = test.scheduler().requests();
    test.renderer_mut().work_loop(&Unbounded).expect("idle slice");
    test.renderer_mut().work_loop(&Unbounded).expect("idle slice");
    assert_eq!(test.scheduler().requests(), before + 2);
}

#[test]
fn rebuilt_handlers_are_swapped_on_commit() {
    let mut test = TestRenderer::new();
    test.render(component(counter, Props::new()))
        .expect("first render");
    test.host_mut().take_ops();
    test.dispatch("h1", "click");
    test.pump_until_idle().expect("pump");

    let h1 = test
        .host()
        .find_by_tag(test.container(), "h1")
        .expect("heading");
    let listener_ops: Vec<_> = test
        .host()
        .ops()
        .iter()
        .filter(|op| {
            matches!(
                op,
                HostOp::AddListener { .. } | HostOp::RemoveListener { .. }
            )
        })
        .cloned()
        .collect();
    assert_eq!(
        listener_ops,
        vec![
            HostOp::RemoveListener {
                id: h1,
                event: "click".into()
            },
            HostOp::AddListener {
                id: h1,
                event: "click".into()
            },
        ]
    );
}

/// `MemoryHost` whose next `append_child` fails once armed.
struct FlakyHost {
    inner: MemoryHost,
    fail_next_append: bool,
}

impl HostTree for FlakyHost {
    fn create_node(&mut self, kind: &crate::host::NodeKind) -> NodeId {
        self.inner.create_node(kind)
    }

    fn set_property(
        &mut self,
        node: NodeId,
        name: &str,
        value: &PropValue,
    ) -> Result<(), HostError> {
        self.inner.set_property(node, name, value)
    }

    fn remove_property(&mut self, node: NodeId, name: &str) -> Result<(), HostError> {
        self.inner.remove_property(node, name)
    }

    fn add_event_listener(
        &mut self,
        node: NodeId,
        event: &str,
        handler: crate::element::EventHandler,
    ) -> Result<(), HostError> {
        self.inner.add_event_listener(node, event, handler)
    }

    fn remove_event_listener(
        &mut self,
        node: NodeId,
        event: &str,
        handler: &crate::element::EventHandler,
    ) -> Result<(), HostError> {
        self.inner.remove_event_listener(node, event, handler)
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), HostError> {
        if std::mem::take(&mut self.fail_next_append) {
            return Err(HostError::Missing { id: child });
        }
        self.inner.append_child(parent, child)
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), HostError> {
        self.inner.remove_child(parent, child)
    }
}

fn item_list(second: Element) -> Element {
    create_element(
        "ul",
        Props::new(),
        vec![create_element("li", Props::new(), vec!["a".into()]), second],
    )
}

#[test]
fn failed_commit_drops_the_pass_without_replaying_it() {
    let scheduler = Arc::new(crate::testing::CountingScheduler::default());
    let mut inner = MemoryHost::new();
    let container = inner.create_container("root");
    let host = FlakyHost {
        inner,
        fail_next_append: false,
    };
    let mut renderer = Renderer::with_runtime(host, Runtime::new(scheduler.clone()));

    let li = || create_element("li", Props::new(), vec!["b".into()]);
    renderer.render(item_list(li()), container);
    assert_eq!(renderer.work_loop(&Unbounded), Ok(WorkStatus::Committed));
    let committed_fibers = renderer.fiber_count();
    renderer.host_mut().inner.take_ops();

    renderer.host_mut().fail_next_append = true;
    renderer.render(item_list(create_element("p", Props::new(), vec!["b".into()])), container);
    let requests = scheduler.requests();
    assert!(matches!(
        renderer.work_loop(&Unbounded),
        Err(HostError::Missing { .. })
    ));
    assert_eq!(scheduler.requests(), requests + 1);
    assert!(!renderer.is_rendering());
    assert!(!renderer.has_pending_work());
    assert_eq!(renderer.fiber_count(), committed_fibers);

    assert_eq!(renderer.work_loop(&Unbounded), Ok(WorkStatus::Idle));
    assert_eq!(renderer.work_loop(&Unbounded), Ok(WorkStatus::Idle));
    let removals = renderer
        .host()
        .inner
        .ops()
        .iter()
        .filter(|op| matches!(op, HostOp::RemoveChild { .. }))
        .count();
    assert_eq!(removals, 1);

    renderer.render(item_list(li()), container);
    assert_eq!(renderer.work_loop(&Unbounded), Ok(WorkStatus::Committed));
    assert_eq!(renderer.fiber_count(), committed_fibers);
}
