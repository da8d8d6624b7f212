use std::cell::RefCell;
use std::rc::Rc;
use todo_mvc_core::todo::{demo_document, ITEM_TEMPLATE, TODO_MOUNT_ID};
use todo_mvc_core::{
    attributes, new_todo, todo_view, AttributeValue, Attributes, Document, HandlerContext,
    Interaction, RenderView, SharedDocument, SharedStore, TemplateError, TodoHandlers, ViewError,
    ViewHandlers,
};

fn scenario_store() -> SharedStore {
    new_todo(attributes([
        ("title", AttributeValue::from("Check attributes...")),
        ("cheese", AttributeValue::from("cheddar")),
    ]))
    .into_shared()
}

fn mount_content(document: &SharedDocument) -> String {
    let document = document.borrow();
    let mount = document.locate(TODO_MOUNT_ID).expect("mount");
    document.content(&mount).expect("mount content").to_string()
}

#[test]
fn render_writes_template_output_into_mount() {
    let document = demo_document();
    let mut view = todo_view(scenario_store(), document.clone()).expect("view");

    let handle = view.render().expect("render");

    assert_eq!(handle.id(), TODO_MOUNT_ID);
    let markup = mount_content(&document);
    assert!(markup.contains("<label>Check attributes...</label>"));
    assert!(markup.contains(r#"<input class="edit" value="Check attributes...">"#));
    assert!(!markup.contains("checked"));
    assert!(!markup.contains("cheddar"));
}

#[test]
fn render_is_idempotent_for_unchanged_store() {
    let document = demo_document();
    let mut view = todo_view(scenario_store(), document.clone()).expect("view");

    view.render().expect("first render");
    let first = mount_content(&document);
    view.render().expect("second render");
    let second = mount_content(&document);

    assert_eq!(first.as_bytes(), second.as_bytes());
}

#[test]
fn render_reflects_store_mutations() {
    let document = demo_document();
    let store = scenario_store();
    let mut view = todo_view(store.clone(), document.clone()).expect("view");
    view.render().expect("first render");

    store.borrow_mut().set("title", "Buy <milk>");
    store.borrow_mut().set("completed", true);
    view.render().expect("second render");

    let markup = mount_content(&document);
    assert!(markup.contains("<label>Buy &lt;milk&gt;</label>"));
    assert!(markup.contains(r#"type="checkbox" checked>"#));
    assert!(!markup.contains("Check attributes..."));
}

#[test]
fn render_caches_editable_element() {
    let document = demo_document();
    let mut view = todo_view(scenario_store(), document).expect("view");
    assert!(view.editable().is_none());

    view.render().expect("render");

    let editable = view.editable().expect("editable element");
    assert_eq!(editable.tag, "input");
    assert!(editable.has_class("edit"));
    assert_eq!(editable.attribute("value"), Some("Check attributes..."));
}

#[test]
fn missing_template_keys_render_as_empty_text() {
    let mut document = Document::new();
    document.add_container(TODO_MOUNT_ID, "li");
    let document = document.into_shared();
    let store = new_todo(Attributes::new()).into_shared();
    let mut view = RenderView::create(
        store,
        document.clone(),
        "#to-do",
        "<p><%= title %>|<%= owner %>|<%- due %></p>",
        TodoHandlers,
    )
    .expect("view");

    view.render().expect("render");

    assert_eq!(mount_content(&document), "<p>||</p>");
}

#[test]
fn construction_fails_when_mount_is_missing() {
    let document = Document::new().into_shared();
    let err = RenderView::create(
        scenario_store(),
        document,
        "#to-do",
        ITEM_TEMPLATE,
        TodoHandlers,
    )
    .err()
    .expect("missing mount must fail");

    assert_eq!(err, ViewError::MountNotFound("to-do".to_string()));
}

#[test]
fn construction_fails_when_template_is_missing_or_invalid() {
    let mut document = Document::new();
    document.add_container(TODO_MOUNT_ID, "li");
    let document = document.into_shared();

    let err = todo_view(scenario_store(), document.clone())
        .err()
        .expect("missing template must fail");
    assert_eq!(err, ViewError::TemplateNotFound("item-template".to_string()));

    let err = RenderView::create(
        scenario_store(),
        document,
        TODO_MOUNT_ID,
        "<label><% title %></label>",
        TodoHandlers,
    )
    .err()
    .expect("evaluate blocks must fail");
    assert!(matches!(
        err,
        ViewError::Template(TemplateError::UnsupportedBlock { .. })
    ));
}

#[test]
fn render_fails_when_mount_disappears() {
    let document = demo_document();
    let mut view = todo_view(scenario_store(), document.clone()).expect("view");
    view.render().expect("render");

    assert!(document.borrow_mut().remove_container(TODO_MOUNT_ID));

    let err = view.render().expect_err("render without mount");
    assert_eq!(err, ViewError::MountNotFound(TODO_MOUNT_ID.to_string()));
    let err = view
        .dispatch(&Interaction::double_click("label").unwrap())
        .expect_err("dispatch without mount");
    assert_eq!(err, ViewError::MountNotFound(TODO_MOUNT_ID.to_string()));
}

#[test]
fn nothing_is_dispatched_before_first_render() {
    let mut view = todo_view(scenario_store(), demo_document()).expect("view");

    let invocations = view
        .dispatch(&Interaction::double_click("label").unwrap())
        .expect("dispatch");

    assert!(invocations.is_empty());
}

#[test]
fn interactions_route_to_declared_handlers() {
    let mut view = todo_view(scenario_store(), demo_document()).expect("view");
    view.render().expect("render");

    let edit = view
        .dispatch(&Interaction::double_click("label").unwrap())
        .expect("dblclick");
    assert_eq!(edit.len(), 1);
    assert_eq!(edit[0].handler, "edit");
    assert_eq!(edit[0].descriptor, "dblclick label");
    assert!(edit[0].message.contains("Check attributes..."));

    let close = view.dispatch(&Interaction::blur(".edit").unwrap()).expect("blur");
    assert_eq!(close.len(), 1);
    assert_eq!(close[0].handler, "close");

    let key = view
        .dispatch(&Interaction::key_press(".edit", "a").unwrap())
        .expect("keypress");
    assert_eq!(key.len(), 1);
    assert_eq!(key[0].handler, "updateOnEnter");
    assert!(key[0].message.contains("key=a"));
    assert!(key[0].message.contains("enter=false"));

    let enter = view
        .dispatch(&Interaction::key_press(".edit", "Enter").unwrap())
        .expect("enter");
    assert!(enter[0].message.contains("enter=true"));
}

#[test]
fn selector_bindings_catch_interactions_from_nested_elements() {
    let mut document = Document::new();
    document.add_container(TODO_MOUNT_ID, "li");
    let document = document.into_shared();
    let mut view = RenderView::create(
        scenario_store(),
        document,
        TODO_MOUNT_ID,
        r#"<label><span class="text"><%- title %></span></label><input class="edit">"#,
        TodoHandlers,
    )
    .expect("view");
    view.render().expect("render");

    let edit = view
        .dispatch(&Interaction::double_click(".text").unwrap())
        .expect("dblclick on nested span");
    assert_eq!(edit.len(), 1);
    assert_eq!(edit[0].handler, "edit");
    assert_eq!(edit[0].descriptor, "dblclick label");

    let outside = view
        .dispatch(&Interaction::double_click(".edit").unwrap())
        .expect("dblclick outside label");
    assert!(outside.is_empty());
}

#[test]
fn unbound_interactions_run_nothing() {
    let mut view = todo_view(scenario_store(), demo_document()).expect("view");
    view.render().expect("render");

    for interaction in [
        Interaction::click("label").unwrap(),
        Interaction::double_click(".edit").unwrap(),
        Interaction::blur("label").unwrap(),
        Interaction::double_click(".missing").unwrap(),
    ] {
        let invocations = view.dispatch(&interaction).expect("dispatch");
        assert!(invocations.is_empty(), "unexpected handler for `{interaction}`");
    }
}

#[test]
fn delegated_dispatch_survives_re_render() {
    let store = scenario_store();
    let mut view = todo_view(store.clone(), demo_document()).expect("view");
    view.render().expect("first render");

    store.borrow_mut().set("title", "Renamed");
    view.render().expect("second render");

    let invocations = view
        .dispatch(&Interaction::double_click("label").unwrap())
        .expect("dblclick");
    assert_eq!(invocations.len(), 1);
    assert!(invocations[0].message.contains("Renamed"));
}

#[test]
fn view_shares_but_does_not_own_the_store() {
    let store = scenario_store();
    let view = todo_view(store.clone(), demo_document()).expect("view");

    assert!(Rc::ptr_eq(view.store(), &store));
    drop(view);
    assert_eq!(Rc::strong_count(&store), 1);
    assert_eq!(
        store.borrow().get("cheese"),
        Some(&AttributeValue::from("cheddar"))
    );
}

#[test]
fn render_reports_busy_store_instead_of_panicking() {
    let store = scenario_store();
    let mut view = todo_view(store.clone(), demo_document()).expect("view");

    let _guard = store.borrow_mut();
    assert_eq!(view.render().expect_err("busy store"), ViewError::StoreBusy);
}

struct CountingHandlers {
    clicks: Rc<RefCell<u32>>,
}

impl CountingHandlers {
    fn count(&mut self, context: &HandlerContext<'_>) -> String {
        *self.clicks.borrow_mut() += 1;
        format!("click on {:?}", context.target.map(|element| element.tag.as_str()))
    }
}

impl ViewHandlers for CountingHandlers {
    const NAME: &'static str = "counting";
    const EVENTS: &'static [(&'static str, &'static str)] = &[("click", "count")];

    fn handler(name: &str) -> Option<todo_mvc_core::view::render_view::Handler<Self>> {
        match name {
            "count" => Some(Self::count),
            _ => None,
        }
    }
}

#[test]
fn root_bindings_receive_clicks_from_any_descendant() {
    let clicks = Rc::new(RefCell::new(0));
    let mut view = RenderView::create(
        scenario_store(),
        demo_document(),
        TODO_MOUNT_ID,
        ITEM_TEMPLATE,
        CountingHandlers {
            clicks: clicks.clone(),
        },
    )
    .expect("view");
    view.render().expect("render");
    assert!(view.editable().is_none());

    view.dispatch(&Interaction::click("label").unwrap())
        .expect("label click");
    view.dispatch(&Interaction::click("input.toggle").unwrap())
        .expect("toggle click");
    let on_mount = view
        .dispatch(&Interaction::on_mount(todo_mvc_core::EventKind::Click))
        .expect("mount click");

    assert_eq!(*clicks.borrow(), 3);
    assert_eq!(on_mount[0].message, "click on None");
}
