use sovran_state::{State, Stateful, StatefulExt, WrongState};
use std::sync::Arc;

// Existing widget types; neither declares a state field
struct Button {
    title: String,
}

struct Slider {
    min: u32,
    max: u32,
}

impl Stateful for Button {}
impl Stateful for Slider {}

// States shared by both widgets
#[derive(Debug, Clone, PartialEq)]
struct Normal;
impl State for Normal {}

#[derive(Debug, Clone, PartialEq)]
struct Disabled {
    opacity: f32,
}
impl State for Disabled {}

#[derive(Debug, Clone, PartialEq)]
struct Highlighted {
    color: u32,
}
impl State for Highlighted {}

#[derive(Debug, Clone, PartialEq)]
struct Dragging {
    value: u32,
}
impl State for Dragging {}

fn main() -> Result<(), WrongState> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .init();

    let ok = Arc::new(Button {
        title: "OK".to_string(),
    });
    let volume = Arc::new(Slider { min: 0, max: 100 });

    // Nothing attached yet
    println!("{} starts with {:?}", ok.title, ok.current_state());

    // Free-form transitions via set
    ok.set(Disabled { opacity: 0.3 });
    ok.set(Normal);
    println!("{} is now {:?}", ok.title, ok.current_state());

    ok.set(Highlighted { color: 0xff8800 });
    let highlighted = ok.at::<Highlighted>()?;
    println!("{} highlighted with color {:#08x}", ok.title, highlighted.color);

    // Guarded evolution via update
    volume.set(Dragging { value: volume.min });
    for _ in 0..3 {
        volume.update(|drag: &mut Dragging| drag.value = (drag.value + 40).min(volume.max))?;
    }
    println!("volume dragged to {}", volume.at::<Dragging>()?.value);

    // Asking for the wrong state is an ordinary error
    match volume.update(|disabled: &mut Disabled| disabled.opacity = 0.0) {
        Ok(()) => println!("volume was disabled"),
        Err(e) => println!("could not update volume: {}", e),
    }

    // Widgets never see each other's state
    println!(
        "button is {:?}, slider is {:?}",
        ok.current_id(),
        volume.current_id()
    );

    ok.reset();
    println!("{} after reset: {:?}", ok.title, ok.current_state());

    Ok(())
}
