//! Todo List Example - Repeater, Displayer and Writer together
//!
//! This example demonstrates:
//! - Rendering a list from an observable sequence
//! - Growing and shrinking it without touching retained items
//! - Swapping content on a condition
//! - Keeping content across remove / reinsert of a placeholder
//!
//! Run with: cargo run --example todo_list

use std::rc::Rc;

use domic::{
    display_if, dom, mount, repeat, write, DisplayContent, NodeId, Observable, Result,
    VirtualHolder, render_component,
};

fn todo_item(title: &String, index: usize) -> NodeId {
    let li = dom::create_element("li");
    let label = dom::create_text(&format!("{}. {title}", index + 1));
    dom::append_child(li, label).ok();
    li
}

fn main() -> Result<()> {
    mount::reset();

    println!("=== domic Todo List Example ===\n");

    let todos = Observable::new(vec!["write docs".to_string(), "review PR".to_string()]);
    let count = todos.length();
    let empty = todos.map(|list| list.is_empty());

    // <main>
    //   <h1>{count}</h1>
    //   <ul>{repeat todos}</ul>
    //   {display_if empty}
    // </main>
    let app = dom::create_element("main");
    let heading = dom::create_element("h1");
    dom::append_child(heading, write(&count)?)?;
    dom::append_child(app, heading)?;

    let list = dom::create_element("ul");
    dom::append_child(list, repeat(&todos, todo_item)?)?;
    dom::append_child(app, list)?;

    let placeholder = display_if(
        &empty,
        Observable::constant(DisplayContent::render(|_: &bool| dom::create_text("nothing left!"))),
        None,
    )?;
    dom::append_child(app, placeholder)?;

    let handle = mount::mount(dom::document(), app)?;
    println!("Initial:      {}", dom::text_content(app));

    todos.update(|list| list.push("ship it".into()));
    println!("After push:   {}", dom::text_content(app));

    todos.update(|list| {
        list.remove(0);
    });
    println!("After remove: {}", dom::text_content(app));

    todos.set(Vec::new());
    println!("Cleared:      {}", dom::text_content(app));

    // A holder keeps its content when its placeholder moves within a frame
    let panel = Rc::new(VirtualHolder::new("panel"));
    let panel_node = render_component(&panel, Some(dom::create_text("still here")))?;
    mount::mount(app, panel_node)?;
    mount::unmount(panel_node)?;
    mount::insert(app, panel_node, dom::first_child(app))?;
    mount::tick()?;
    println!("Moved panel:  {}", dom::to_markup(app));

    handle.unmount()?;
    mount::tick()?;
    println!("\nUnmounted. Pending frames: {}", domic::scheduler::pending_frames());
    Ok(())
}
