//! FLIP reorder animation.
//!
//! Before a DOM mutation, [`AnimationManager::capture_animation_state`]
//! records where each item is drawn. After it, [`AnimationManager::animate_all`]
//! inverts every item that moved with a translate transform and plays it back
//! to zero with a CSS transition. Timers are driven by [`AnimationManager::tick`].

use crate::ghost::chain_scale;
use dnrkit_core::geometry::transform::to_css_translate;
use dnrkit_core::{Dom, ElementId, Instant};
use kurbo::{Point, Rect, Vec2};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// Tolerance used by the straight-line continuation test.
const COLLINEAR_EPSILON: f64 = 1e-6;

/// Rect of an item captured before a mutation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationState {
    pub target: ElementId,
    /// Where the item was drawn, including any running animation.
    pub rect: Rect,
}

#[derive(Debug, Clone, Copy)]
struct Motion {
    offset: Vec2,
    started: Instant,
    duration: Duration,
}

impl Motion {
    fn ends_at(&self) -> Instant {
        self.started + self.duration
    }

    /// Remaining visual offset, assuming a linear timing curve.
    fn offset_at(&self, now: Instant) -> Vec2 {
        if self.duration.is_zero() {
            return Vec2::ZERO;
        }
        let elapsed = now.saturating_duration_since(self.started).as_secs_f64();
        let progress = (elapsed / self.duration.as_secs_f64()).clamp(0.0, 1.0);
        self.offset * (1.0 - progress)
    }
}

#[derive(Debug, Clone, Default)]
struct Track {
    from_rect: Option<Rect>,
    prev_from_rect: Option<Rect>,
    prev_to_rect: Option<Rect>,
    duration: Option<Duration>,
    reset_at: Option<Instant>,
    motion: Option<Motion>,
}

impl Track {
    fn is_idle(&self) -> bool {
        self.motion.is_none() && self.duration.is_none() && self.from_rect.is_none()
    }

    fn reset(&mut self) {
        self.from_rect = None;
        self.prev_from_rect = None;
        self.prev_to_rect = None;
        self.duration = None;
        self.reset_at = None;
    }
}

fn rect_equal(a: Rect, b: Rect) -> bool {
    a.x0.round() == b.x0.round()
        && a.y0.round() == b.y0.round()
        && a.width().round() == b.width().round()
        && a.height().round() == b.height().round()
}

/// `a` lies on the ray from `to` through `from`.
fn continues_line(a: Point, from: Point, to: Point) -> bool {
    let u = a - to;
    let v = from - to;
    u.cross(v).abs() <= COLLINEAR_EPSILON * (u.hypot() * v.hypot()).max(1.0) && u.dot(v) >= 0.0
}

fn clear_inline_motion(dom: &mut dyn Dom, element: ElementId) {
    for property in ["transition", "transform"] {
        if let Err(err) = dom.remove_style(element, property) {
            log::warn!("Failed to clear {property} of {element}: {err}");
        }
    }
}

pub type AnimationCallback = Box<dyn FnOnce()>;

/// FLIP animation for the items of one list.
pub struct AnimationManager {
    list: ElementId,
    duration: Duration,
    easing: Option<String>,
    states: Vec<AnimationState>,
    tracks: HashMap<ElementId, Track>,
    pending: Option<(Instant, AnimationCallback)>,
}

impl fmt::Debug for AnimationManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationManager")
            .field("list", &self.list)
            .field("duration", &self.duration)
            .field("captured", &self.states.len())
            .field("animating", &self.is_animating())
            .finish()
    }
}

impl AnimationManager {
    pub fn new(list: ElementId, duration_ms: u64, easing: Option<String>) -> Self {
        Self {
            list,
            duration: Duration::from_millis(duration_ms),
            easing,
            states: Vec::new(),
            tracks: HashMap::new(),
            pending: None,
        }
    }

    pub fn set_timing(&mut self, duration_ms: u64, easing: Option<String>) {
        self.duration = Duration::from_millis(duration_ms);
        self.easing = easing;
    }

    pub fn captured(&self) -> &[AnimationState] {
        &self.states
    }

    pub fn is_animating(&self) -> bool {
        self.tracks.values().any(|t| t.motion.is_some())
    }

    pub fn animating_elements(&self) -> Vec<ElementId> {
        let mut elements: Vec<_> = self
            .tracks
            .iter()
            .filter(|(_, t)| t.motion.is_some())
            .map(|(&el, _)| el)
            .collect();
        elements.sort();
        elements
    }

    /// Duration of the element's current animation.
    pub fn animation_duration(&self, element: ElementId) -> Option<Duration> {
        self.tracks.get(&element)?.motion.map(|m| m.duration)
    }

    /// Record every visible item's rect, skipping `exclude` (the drag ghost).
    pub fn capture_animation_state(&mut self, dom: &dyn Dom, exclude: &[ElementId], now: Instant) {
        self.states.clear();
        if self.duration.is_zero() {
            return;
        }
        for child in dom.children(self.list) {
            if exclude.contains(&child) || !dom.is_displayed(child) {
                continue;
            }
            let Some(layout) = dom.layout_rect(child) else {
                continue;
            };
            let track = self.tracks.entry(child).or_default();
            // Hosts that do not report running transitions only know the end
            // value, so the remaining offset is modeled.
            let drawn = if dom.tracks_transitions() {
                dom.rect(child).unwrap_or(layout)
            } else {
                layout + track.motion.map(|m| m.offset_at(now)).unwrap_or(Vec2::ZERO)
            };
            self.states.push(AnimationState {
                target: child,
                rect: drawn,
            });
            track.from_rect = Some(layout);
        }
    }

    /// Animate every captured item from its captured rect to its current one.
    ///
    /// `callback` runs once when the longest animation ends, or immediately
    /// when nothing animates. A callback still pending from an earlier call
    /// is dropped.
    pub fn animate_all(&mut self, dom: &mut dyn Dom, now: Instant, callback: Option<AnimationCallback>) {
        self.expire(now);
        let states = std::mem::take(&mut self.states);
        if self.duration.is_zero() {
            self.pending = None;
            if let Some(callback) = callback {
                callback();
            }
            return;
        }

        let mut longest = Duration::ZERO;
        for state in states {
            let Some(to_rect) = dom.layout_rect(state.target) else {
                continue;
            };
            let track = self.tracks.entry(state.target).or_default().clone();
            let Some(from_rect) = track.from_rect else {
                continue;
            };

            let mut time = Duration::ZERO;
            if track.duration.is_some() {
                if let (Some(prev_from), Some(prev_to)) = (track.prev_from_rect, track.prev_to_rect) {
                    if rect_equal(prev_from, to_rect)
                        && !rect_equal(from_rect, to_rect)
                        && continues_line(state.rect.origin(), from_rect.origin(), to_rect.origin())
                    {
                        time = self.real_time(state.rect, prev_from, prev_to);
                    }
                }
            }

            if !rect_equal(to_rect, from_rect) {
                if let Some(t) = self.tracks.get_mut(&state.target) {
                    t.prev_from_rect = Some(from_rect);
                    t.prev_to_rect = Some(to_rect);
                }
                if time.is_zero() {
                    time = self.duration;
                }
                self.animate(dom, state.target, state.rect, to_rect, time, now);
            }

            if !time.is_zero() {
                longest = longest.max(time);
                if let Some(t) = self.tracks.get_mut(&state.target) {
                    t.duration = Some(time);
                    t.reset_at = Some(now + time);
                }
            }
        }

        if longest.is_zero() {
            self.pending = None;
            if let Some(callback) = callback {
                callback();
            }
        } else {
            self.pending = callback.map(|cb| (now + longest, cb));
        }
    }

    /// Duration for re-animating back toward where the previous animation
    /// started, in proportion to the distance already covered.
    fn real_time(&self, animating: Rect, from: Rect, to: Rect) -> Duration {
        let covered = animating.origin().distance(from.origin());
        let total = from.origin().distance(to.origin());
        if total <= 0.0 {
            return self.duration;
        }
        Duration::from_secs_f64(self.duration.as_secs_f64() * covered / total)
    }

    fn animate(&mut self, dom: &mut dyn Dom, target: ElementId, current: Rect, to: Rect, duration: Duration, now: Instant) {
        let scale = chain_scale(dom, self.list);
        let offset = Vec2::new(
            (current.x0 - to.x0) / scale.x.max(f64::EPSILON),
            (current.y0 - to.y0) / scale.y.max(f64::EPSILON),
        );
        let transition = match &self.easing {
            Some(easing) => format!("transform {}ms {easing}", duration.as_millis()),
            None => format!("transform {}ms", duration.as_millis()),
        };

        let steps = [
            ("transition", String::new()),
            ("transform", to_css_translate(offset)),
            ("transition", transition),
            ("transform", to_css_translate(Vec2::ZERO)),
        ];
        for (property, value) in &steps {
            if let Err(err) = dom.set_style(target, property, value) {
                log::warn!("Animation of {target} skipped: {err}");
                return;
            }
        }
        log::trace!("Animating {target} by {offset:?} over {duration:?}");
        self.tracks.entry(target).or_default().motion = Some(Motion {
            offset,
            started: now,
            duration,
        });
    }

    fn expire(&mut self, now: Instant) {
        for track in self.tracks.values_mut() {
            if track.reset_at.is_some_and(|at| at <= now) {
                track.reset();
            }
        }
    }

    /// Advance timers. Returns true when the completion callback ran.
    pub fn tick(&mut self, dom: &mut dyn Dom, now: Instant) -> bool {
        for (&element, track) in self.tracks.iter_mut() {
            if track.motion.is_some_and(|m| m.ends_at() <= now) {
                track.motion = None;
                clear_inline_motion(dom, element);
            }
        }
        self.expire(now);
        self.tracks.retain(|_, t| !t.is_idle());

        match self.pending.take() {
            Some((at, callback)) if at <= now => {
                callback();
                true
            }
            other => {
                self.pending = other;
                false
            }
        }
    }

    /// Stop everything now: clear inline transitions and transforms, timers
    /// and the pending callback.
    pub fn cancel(&mut self, dom: &mut dyn Dom) {
        for (&element, track) in &self.tracks {
            if track.motion.is_some() {
                clear_inline_motion(dom, element);
            }
        }
        self.tracks.clear();
        self.states.clear();
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dnrkit_core::{FlowAxis, MemoryDom};
    use std::cell::Cell;
    use std::rc::Rc;

    fn list_of_three() -> (MemoryDom, ElementId, Vec<ElementId>) {
        let mut dom = MemoryDom::new();
        let body = dom.body();
        let list = dom.spawn(body, "ul", Rect::new(0.0, 0.0, 200.0, 300.0)).unwrap();
        dom.set_flow(list, FlowAxis::Vertical, 0.0);
        let items = (0..3)
            .map(|_| dom.spawn(list, "li", Rect::new(0.0, 0.0, 200.0, 30.0)).unwrap())
            .collect();
        (dom, list, items)
    }

    fn ms(base: Instant, n: u64) -> Instant {
        base + Duration::from_millis(n)
    }

    #[test]
    fn test_flip_inverts_and_completes() {
        let (mut dom, list, items) = list_of_three();
        let (a, b, c) = (items[0], items[1], items[2]);
        let mut anim = AnimationManager::new(list, 150, Some("ease".into()));
        let now = Instant::now();

        anim.capture_animation_state(&dom, &[], now);
        assert_eq!(anim.captured().len(), 3);
        dom.insert_before(list, c, Some(a)).unwrap();

        let done = Rc::new(Cell::new(0));
        let d = Rc::clone(&done);
        anim.animate_all(&mut dom, now, Some(Box::new(move || d.set(d.get() + 1))));

        assert!(anim.is_animating());
        let mut expected = vec![a, b, c];
        expected.sort();
        assert_eq!(anim.animating_elements(), expected);
        assert_eq!(dom.inline_style(a, "transition").as_deref(), Some("transform 150ms ease"));
        assert_eq!(dom.inline_style(c, "transform").as_deref(), Some("translate3d(0px, 0px, 0)"));

        assert!(!anim.tick(&mut dom, ms(now, 149)));
        assert_eq!(done.get(), 0);
        assert!(anim.tick(&mut dom, ms(now, 150)));
        assert_eq!(done.get(), 1);
        assert!(!anim.is_animating());
        assert!(dom.inline_style(a, "transform").is_none());
        assert!(!anim.tick(&mut dom, ms(now, 500)));
        assert_eq!(done.get(), 1);
    }

    #[test]
    fn test_unmoved_items_do_not_animate() {
        let (mut dom, list, items) = list_of_three();
        let mut anim = AnimationManager::new(list, 150, None);
        let now = Instant::now();
        anim.capture_animation_state(&dom, &[], now);
        dom.insert_before(list, items[1], Some(items[0])).unwrap();
        anim.animate_all(&mut dom, now, None);
        assert_eq!(anim.animating_elements().len(), 2);
        assert!(anim.animation_duration(items[2]).is_none());
    }

    #[test]
    fn test_zero_duration_calls_back_immediately() {
        let (mut dom, list, items) = list_of_three();
        let mut anim = AnimationManager::new(list, 0, None);
        let now = Instant::now();
        anim.capture_animation_state(&dom, &[], now);
        assert!(anim.captured().is_empty());
        dom.insert_before(list, items[2], Some(items[0])).unwrap();

        let done = Rc::new(Cell::new(false));
        let d = Rc::clone(&done);
        anim.animate_all(&mut dom, now, Some(Box::new(move || d.set(true))));
        assert!(done.get());
        assert!(!anim.is_animating());
    }

    #[test]
    fn test_excluded_elements_are_not_captured() {
        let (dom, list, items) = list_of_three();
        let mut anim = AnimationManager::new(list, 100, None);
        anim.capture_animation_state(&dom, &[items[1]], Instant::now());
        assert!(anim.captured().iter().all(|s| s.target != items[1]));
        assert_eq!(anim.captured().len(), 2);
    }

    #[test]
    fn test_reversal_mid_flight_shortens_duration() {
        let (mut dom, list, items) = list_of_three();
        let (a, _, c) = (items[0], items[1], items[2]);
        let mut anim = AnimationManager::new(list, 150, None);
        let now = Instant::now();

        anim.capture_animation_state(&dom, &[], now);
        dom.insert_before(list, c, Some(a)).unwrap();
        anim.animate_all(&mut dom, now, None);

        // Halfway through, A is drawn at y = 15 while laid out at y = 30.
        let half = ms(now, 75);
        anim.capture_animation_state(&dom, &[], half);
        let state = anim.captured().iter().find(|s| s.target == a).copied().unwrap();
        assert!((state.rect.y0 - 15.0).abs() < 1e-6);

        dom.append_child(list, c).unwrap();
        anim.animate_all(&mut dom, half, None);
        let duration = anim.animation_duration(a).unwrap().as_secs_f64();
        assert!((duration - 0.075).abs() < 1e-6, "{duration}");
    }

    #[test]
    fn test_interrupted_capture_uses_drawn_position() {
        let (mut dom, list, items) = list_of_three();
        dom.set_tracks_transitions(true);
        let (a, _, c) = (items[0], items[1], items[2]);
        let mut anim = AnimationManager::new(list, 150, None);
        let now = Instant::now();

        anim.capture_animation_state(&dom, &[], now);
        dom.insert_before(list, c, Some(a)).unwrap();
        anim.animate_all(&mut dom, now, None);
        assert_eq!(dom.inline_style(a, "transform").as_deref(), Some("translate3d(0px, 0px, 0)"));

        // The host reports A halfway between y = 0 and its new slot at y = 30.
        dom.set_computed_style(a, "transform", "matrix(1, 0, 0, 1, 0, -15)");
        let half = ms(now, 75);
        anim.capture_animation_state(&dom, &[], half);
        let state = anim.captured().iter().find(|s| s.target == a).copied().unwrap();
        assert_eq!(Some(state.rect), dom.rect(a));
        assert!((state.rect.y0 - 15.0).abs() < 1e-6, "{:?}", state.rect);

        dom.append_child(list, c).unwrap();
        anim.animate_all(&mut dom, half, None);
        let duration = anim.animation_duration(a).unwrap().as_secs_f64();
        assert!((duration - 0.075).abs() < 1e-6, "{duration}");
    }

    #[test]
    fn test_style_failures_do_not_stop_timers() {
        let (mut dom, list, items) = list_of_three();
        let mut anim = AnimationManager::new(list, 150, None);
        let now = Instant::now();
        anim.capture_animation_state(&dom, &[], now);
        dom.insert_before(list, items[2], Some(items[0])).unwrap();
        anim.animate_all(&mut dom, now, None);

        // A host that no longer knows the items rejects every style write.
        let mut detached = MemoryDom::new();
        anim.tick(&mut detached, ms(now, 150));
        assert!(!anim.is_animating());
        assert_eq!(dom.inline_style(items[0], "transition").as_deref(), Some("transform 150ms"));
    }

    #[test]
    fn test_cancel_clears_styles_and_callback() {
        let (mut dom, list, items) = list_of_three();
        let mut anim = AnimationManager::new(list, 150, None);
        let now = Instant::now();
        anim.capture_animation_state(&dom, &[], now);
        dom.insert_before(list, items[2], Some(items[0])).unwrap();

        let done = Rc::new(Cell::new(false));
        let d = Rc::clone(&done);
        anim.animate_all(&mut dom, now, Some(Box::new(move || d.set(true))));
        anim.cancel(&mut dom);

        assert!(!anim.is_animating());
        for item in items {
            assert!(dom.inline_style(item, "transition").is_none());
            assert!(dom.inline_style(item, "transform").is_none());
        }
        assert!(!anim.tick(&mut dom, ms(now, 1000)));
        assert!(!done.get());
    }
}
