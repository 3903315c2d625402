use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use libbooklet::config::StyleState;
use libbooklet::controller::PendingTurn;
use libbooklet::page::Placement;
use libbooklet::{Booklet, Control, ControlState, Effect, PageId, Settings, Surface};
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CustomEvent, Document, Element, EventTarget, HtmlElement, MouseEvent, Node};

const CLOSE_EVENT: &str = "onBookletClose";

fn warn(err: &JsValue) {
    web_sys::console::warn_1(err);
}

fn px(value: i32) -> String {
    format!("{value}px")
}

/// Styles page images through their inline style and toggles the disabled
/// class on the control buttons under the booklet root.
struct DomSurface {
    root: Element,
    document: Document,
    settings: Settings,
}

impl DomSurface {
    fn control_selector(&self, control: Control) -> &str {
        let controls = &self.settings.controls;
        match control {
            Control::Next => &controls.next,
            Control::Prev => &controls.prev,
            Control::Close => &controls.close,
        }
    }

    /// The control button `target` sits in, if any.
    fn control_at(&self, target: &Element) -> Option<(Control, Element)> {
        let controls = &self.settings.controls;
        let candidates = [
            (Control::Next, format!("{} {}", controls.container, controls.next)),
            (Control::Prev, format!("{} {}", controls.container, controls.prev)),
            (Control::Close, controls.close.clone()),
        ];
        candidates.into_iter().find_map(|(control, selector)| {
            let button = target.closest(&selector).ok().flatten()?;
            let node: &Node = &button;
            self.root.contains(Some(node)).then_some((control, button))
        })
    }

    fn is_marked_disabled(&self, button: &Element) -> bool {
        button
            .class_list()
            .contains(&self.settings.disabled_button_class)
    }
}

fn emit_close(document: &Document) {
    let result = CustomEvent::new(CLOSE_EVENT).and_then(|event| document.dispatch_event(&event));
    if let Err(err) = result {
        warn(&err);
    }
}

impl Surface for DomSurface {
    type Element = HtmlElement;

    fn place(&mut self, element: &HtmlElement, placement: Placement) {
        let style = element.style();
        let result = style
            .set_property("position", "absolute")
            .and_then(|_| {
                let height = i32::try_from(placement.height).unwrap_or(i32::MAX);
                style.set_property("height", &px(height))
            })
            .and_then(|_| style.set_property("z-index", &placement.z_index.to_string()));
        if let Err(err) = result {
            warn(&err);
        }
    }

    fn apply_style(&mut self, element: &HtmlElement, state: StyleState) {
        let style = element.style();
        let result = style
            .set_property("transition", "none")
            .and_then(|_| style.set_property("width", &px(state.width)))
            .and_then(|_| style.set_property("right", &px(state.right)));
        if let Err(err) = result {
            warn(&err);
        }
        // force a layout so a following transition starts from this state
        let _ = element.offset_width();
    }

    fn animate_to(&mut self, element: &HtmlElement, state: StyleState, duration_ms: u32) {
        let style = element.style();
        let transition = format!("width {duration_ms}ms ease-in-out, right {duration_ms}ms ease-in-out");
        let result = style
            .set_property("transition", &transition)
            .and_then(|_| style.set_property("width", &px(state.width)))
            .and_then(|_| style.set_property("right", &px(state.right)));
        if let Err(err) = result {
            warn(&err);
        }
    }

    fn set_disabled(&mut self, control: Control, disabled: bool) {
        let buttons = match self.root.query_selector_all(self.control_selector(control)) {
            Ok(buttons) => buttons,
            Err(err) => return warn(&err),
        };
        for i in 0..buttons.length() {
            let Some(button) = buttons.item(i).and_then(|n| n.dyn_into::<Element>().ok()) else {
                continue;
            };
            if let Err(err) = button
                .class_list()
                .toggle_with_force(&self.settings.disabled_button_class, disabled)
            {
                warn(&err);
            }
        }
    }

    fn emit_close(&mut self) {
        emit_close(&self.document);
    }
}

/// An event listener that unregisters itself when dropped.
struct Listener {
    target: EventTarget,
    kind: &'static str,
    closure: Closure<dyn FnMut(MouseEvent)>,
}

impl Listener {
    fn attach(
        target: EventTarget,
        kind: &'static str,
        closure: Closure<dyn FnMut(MouseEvent)>,
    ) -> Result<Self, JsValue> {
        target.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())?;
        Ok(Self {
            target,
            kind,
            closure,
        })
    }

    fn remove(&self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.kind, self.closure.as_ref().unchecked_ref());
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        self.remove();
    }
}

struct Inner {
    booklet: RefCell<Booklet<HtmlElement>>,
    surface: RefCell<DomSurface>,
    listeners: RefCell<Vec<Listener>>,
    detached: Cell<bool>,
}

impl Inner {
    fn is_mounted_on(&self, root: &Element) -> bool {
        let surface = self.surface.borrow();
        let mounted: &JsValue = &surface.root;
        let root: &JsValue = root;
        mounted == root
    }

    /// Stops listening and turns pending timers into no-ops. The closures
    /// themselves live until `Inner` drops, since one of them may be running.
    fn detach(&self) {
        self.detached.set(true);
        for listener in self.listeners.borrow().iter() {
            listener.remove();
        }
    }
}

thread_local! {
    /// Mounted booklets. They stay wired to the DOM until destroyed, however
    /// long the JS side keeps its handles.
    static MOUNTED: RefCell<Vec<Rc<Inner>>> = RefCell::new(Vec::new());
}

/// Detaches and forgets every mounted booklet matching `which`.
fn unmount(which: impl Fn(&Rc<Inner>) -> bool) {
    let removed: Vec<Rc<Inner>> = MOUNTED.with(|mounted| {
        let mut mounted = mounted.borrow_mut();
        let (removed, kept): (Vec<_>, Vec<_>) = mounted.drain(..).partition(|inner| which(inner));
        *mounted = kept;
        removed
    });
    for inner in removed {
        inner.detach();
    }
}

fn run(inner: &Rc<Inner>, effects: Vec<Effect>) {
    for effect in effects {
        match effect.delay_ms() {
            0 => apply_now(inner, &effect),
            delay => schedule(inner, effect, delay),
        }
    }
}

fn apply_now(inner: &Inner, effect: &Effect) {
    if inner.detached.get() {
        return;
    }
    match effect {
        // close listeners may call straight back into this booklet
        Effect::Close => {
            let document = inner.surface.borrow().document.clone();
            emit_close(&document);
        }
        _ => {
            let mut surface = inner.surface.borrow_mut();
            inner.booklet.borrow_mut().apply(effect, &mut *surface);
        }
    }
}

/// Runs `effect` after `delay` ms. The timer only holds a weak reference,
/// so it does nothing once the booklet has been destroyed or dropped.
fn schedule(inner: &Rc<Inner>, effect: Effect, delay: u32) {
    let weak: Weak<Inner> = Rc::downgrade(inner);
    let callback = Closure::once_into_js(move || {
        if let Some(inner) = weak.upgrade() {
            apply_now(&inner, &effect);
        }
    });
    let Some(window) = web_sys::window() else {
        return;
    };
    let timeout = i32::try_from(delay).unwrap_or(i32::MAX);
    if let Err(err) =
        window.set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), timeout)
    {
        warn(&err);
    }
}

/// Images of every panel matching `panel_selector`, panel by panel.
fn page_images(root: &Element, panel_selector: &str) -> Result<Vec<HtmlElement>, JsValue> {
    let panels = root.query_selector_all(panel_selector)?;
    let mut images = Vec::new();
    for i in 0..panels.length() {
        let Some(panel) = panels.item(i).and_then(|n| n.dyn_into::<Element>().ok()) else {
            continue;
        };
        let nodes = panel.query_selector_all("img")?;
        images.extend(
            (0..nodes.length())
                .filter_map(|j| nodes.item(j))
                .filter_map(|node| node.dyn_into::<HtmlElement>().ok()),
        );
    }
    Ok(images)
}

fn attach_page_listeners(inner: &Rc<Inner>) -> Result<(), JsValue> {
    let pages: Vec<(PageId, HtmlElement)> = inner
        .booklet
        .borrow()
        .pages()
        .iter()
        .map(|page| (page.id, page.element.clone()))
        .collect();

    let mut listeners = inner.listeners.borrow_mut();
    for (id, element) in pages {
        let weak = Rc::downgrade(inner);
        let on_down = Closure::<dyn FnMut(MouseEvent)>::new(move |event: MouseEvent| {
            event.prevent_default();
            if let Some(inner) = weak.upgrade() {
                inner.booklet.borrow_mut().pointer_down(id, event.page_x());
            }
        });
        listeners.push(Listener::attach(element.clone().into(), "mousedown", on_down)?);

        let weak = Rc::downgrade(inner);
        let on_up = Closure::<dyn FnMut(MouseEvent)>::new(move |event: MouseEvent| {
            if let Some(inner) = weak.upgrade() {
                let effects = inner.booklet.borrow_mut().pointer_up(id, event.page_x());
                run(&inner, effects);
            }
        });
        listeners.push(Listener::attach(element.into(), "mouseup", on_up)?);
    }
    Ok(())
}

fn attach_control_listener(inner: &Rc<Inner>) -> Result<(), JsValue> {
    let weak = Rc::downgrade(inner);
    let on_click = Closure::<dyn FnMut(MouseEvent)>::new(move |event: MouseEvent| {
        let Some(inner) = weak.upgrade() else {
            return;
        };
        let Some(target) = event.target().and_then(|t| t.dyn_into::<Element>().ok()) else {
            return;
        };
        let Some((control, button)) = inner.surface.borrow().control_at(&target) else {
            return;
        };
        event.prevent_default();
        if control != Control::Close && inner.surface.borrow().is_marked_disabled(&button) {
            return;
        }
        let effects = inner.booklet.borrow_mut().click(control);
        run(&inner, effects);
    });
    let root: EventTarget = inner.surface.borrow().root.clone().into();
    inner
        .listeners
        .borrow_mut()
        .push(Listener::attach(root, "click", on_click)?);
    Ok(())
}

#[derive(Serialize)]
struct State {
    current: usize,
    page_count: usize,
    controls: ControlState,
    pending: Option<PendingTurn>,
}

/// A booklet attached to a DOM subtree.
///
/// The booklet stays mounted when the handle is freed (`free()` or garbage
/// collection); only `destroy()`, or a new booklet on the same root, takes
/// it down.
#[wasm_bindgen]
pub struct BookletHandle {
    inner: Rc<Inner>,
}

#[wasm_bindgen]
impl BookletHandle {
    pub fn current(&self) -> usize {
        self.inner.booklet.borrow().current()
    }

    /// Detaches every listener. Pending animations are dropped.
    pub fn destroy(&self) {
        unmount(|inner| Rc::ptr_eq(inner, &self.inner));
        self.inner.detach();
    }

    #[wasm_bindgen(js_name = isMounted)]
    pub fn is_mounted(&self) -> bool {
        !self.inner.detached.get()
    }

    #[wasm_bindgen(js_name = pageCount)]
    pub fn page_count(&self) -> usize {
        self.inner.booklet.borrow().page_count()
    }

    #[wasm_bindgen(js_name = turnNext)]
    pub fn turn_next(&self) {
        let effects = self.inner.booklet.borrow_mut().turn_next();
        run(&self.inner, effects);
    }

    #[wasm_bindgen(js_name = turnPrev)]
    pub fn turn_prev(&self) {
        let effects = self.inner.booklet.borrow_mut().turn_prev();
        run(&self.inner, effects);
    }

    /// Current state as a JSON string.
    pub fn state(&self) -> String {
        let booklet = self.inner.booklet.borrow();
        let state = State {
            current: booklet.current(),
            page_count: booklet.page_count(),
            controls: booklet.controls(),
            pending: booklet.pending(),
        };
        serde_json::to_string(&state).unwrap_or_else(|e| format!("Serialization error: {}", e))
    }
}

/// Attaches a booklet to `root`. `options` is a JSON object merged over the
/// defaults; pass an empty string for none.
#[wasm_bindgen(js_name = createBooklet)]
pub fn create_booklet(root: Element, options: &str) -> Result<BookletHandle, JsValue> {
    let settings = Settings::from_json_str(options)
        .map_err(|e| JsValue::from_str(&format!("Error: {}", e)))?;
    let document = root
        .owner_document()
        .ok_or_else(|| JsValue::from_str("Error: booklet root is not in a document"))?;

    unmount(|inner| inner.is_mounted_on(&root));

    let left = page_images(&root, &settings.panels.left)?;
    let right = page_images(&root, &settings.panels.right)?;
    let booklet = Booklet::new(settings.clone(), left, right);

    let inner = Rc::new(Inner {
        booklet: RefCell::new(booklet),
        surface: RefCell::new(DomSurface {
            root,
            document,
            settings,
        }),
        listeners: RefCell::new(Vec::new()),
        detached: Cell::new(false),
    });
    attach_page_listeners(&inner)?;
    attach_control_listener(&inner)?;

    let effects = inner.booklet.borrow().mount();
    run(&inner, effects);
    MOUNTED.with(|mounted| mounted.borrow_mut().push(inner.clone()));
    Ok(BookletHandle { inner })
}

/// Attaches a booklet to every element matching the `container` option.
#[wasm_bindgen(js_name = createBooklets)]
pub fn create_booklets(options: &str) -> Result<Vec<BookletHandle>, JsValue> {
    let settings = Settings::from_json_str(options)
        .map_err(|e| JsValue::from_str(&format!("Error: {}", e)))?;
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("Error: no document"))?;
    let roots = document.query_selector_all(&settings.container)?;
    (0..roots.length())
        .filter_map(|i| roots.item(i))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .map(|root| create_booklet(root, options))
        .collect()
}
