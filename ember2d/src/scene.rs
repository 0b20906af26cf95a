use std::collections::HashMap;

use anyhow::Result;

use crate::engine::EngineContext;
use crate::error::EngineError;
use crate::input::InputEvent;
use crate::render::Surface;

/// A named game state: title screen, level, pause overlay...
///
/// Every hook has an empty default so a scene only implements what it needs.
/// Only the scene on top of the [`SceneManager`] stack receives events,
/// updates and render calls.
pub trait Scene {
    /// Registry key. Must stay the same for the lifetime of the scene.
    fn name(&self) -> &str;

    /// Called when the scene becomes current through a change or a push.
    fn on_enter(&mut self, _ctx: &mut EngineContext) -> Result<()> {
        Ok(())
    }

    /// Called when the scene is replaced or popped. Not called when another
    /// scene is pushed over it.
    fn on_exit(&mut self, _ctx: &mut EngineContext) -> Result<()> {
        Ok(())
    }

    fn handle_events(&mut self, _events: &[InputEvent], _ctx: &mut EngineContext) -> Result<()> {
        Ok(())
    }

    fn update(&mut self, _dt: f64, _ctx: &mut EngineContext) -> Result<()> {
        Ok(())
    }

    fn render(&mut self, _surface: &mut dyn Surface) -> Result<()> {
        Ok(())
    }
}

/// A scene transition queued from inside a scene hook.
///
/// Scenes cannot reach the manager that owns them, so they ask through
/// [`EngineContext`] and the loop applies the request after the frame's
/// update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SceneRequest {
    Change(String),
    Push(String),
    Pop,
}

/// Registry of scenes plus the stack of active ones.
///
/// The top of the stack is the current scene. Scenes below it are suspended:
/// they keep their state but get no calls until the scenes above are popped.
#[derive(Default)]
pub struct SceneManager {
    scenes: HashMap<String, Box<dyn Scene>>,
    stack: Vec<String>,
}

impl SceneManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a scene under its name, replacing any scene with that name.
    pub fn add_scene(&mut self, scene: Box<dyn Scene>) {
        let name = scene.name().to_string();
        if self.scenes.insert(name.clone(), scene).is_some() {
            log::debug!("Replaced scene '{}'", name);
        }
    }

    /// Unregister a scene. Scenes that are on the stack are kept.
    pub fn remove_scene(&mut self, name: &str) -> Option<Box<dyn Scene>> {
        if self.stack.iter().any(|n| n == name) {
            log::warn!("Refusing to remove scene '{}' while it is on the stack", name);
            return None;
        }
        self.scenes.remove(name)
    }

    pub fn get_scene(&self, name: &str) -> Option<&dyn Scene> {
        self.scenes.get(name).map(|scene| scene.as_ref())
    }

    pub fn get_scene_mut(&mut self, name: &str) -> Option<&mut (dyn Scene + 'static)> {
        self.scenes.get_mut(name).map(|scene| scene.as_mut())
    }

    pub fn has_scene(&self, name: &str) -> bool {
        self.scenes.contains_key(name)
    }

    /// Replace the whole stack with `name`.
    ///
    /// Only the current scene gets `on_exit`; suspended scenes below it are
    /// dropped from the stack silently.
    pub fn change_scene(&mut self, name: &str, ctx: &mut EngineContext) -> Result<()> {
        self.ensure_registered(name)?;
        if let Some(current) = self.current_mut() {
            current.on_exit(ctx)?;
        }
        self.stack.clear();
        self.stack.push(name.to_string());
        log::info!("Changed scene to '{}'", name);
        self.enter_top(ctx)
    }

    /// Suspend the current scene and make `name` current.
    pub fn push_scene(&mut self, name: &str, ctx: &mut EngineContext) -> Result<()> {
        self.ensure_registered(name)?;
        self.stack.push(name.to_string());
        log::debug!("Pushed scene '{}' (depth {})", name, self.stack.len());
        self.enter_top(ctx)
    }

    /// Exit and remove the current scene, resuming the one below it.
    ///
    /// The resumed scene does not get `on_enter` again. Fails with
    /// [`EngineError::EmptySceneStack`] if fewer than two scenes are stacked.
    pub fn pop_scene(&mut self, ctx: &mut EngineContext) -> Result<()> {
        if self.stack.len() <= 1 {
            return Err(EngineError::EmptySceneStack.into());
        }
        if let Some(current) = self.current_mut() {
            current.on_exit(ctx)?;
        }
        if let Some(name) = self.stack.pop() {
            log::debug!("Popped scene '{}' (depth {})", name, self.stack.len());
        }
        Ok(())
    }

    pub fn current_scene_name(&self) -> Option<&str> {
        self.stack.last().map(String::as_str)
    }

    pub fn current_scene(&self) -> Option<&dyn Scene> {
        self.get_scene(self.current_scene_name()?)
    }

    /// Names on the stack, bottom first.
    pub fn stack_names(&self) -> &[String] {
        &self.stack
    }

    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    pub fn handle_events(&mut self, events: &[InputEvent], ctx: &mut EngineContext) -> Result<()> {
        match self.current_mut() {
            Some(scene) => scene.handle_events(events, ctx),
            None => Ok(()),
        }
    }

    pub fn update(&mut self, dt: f64, ctx: &mut EngineContext) -> Result<()> {
        match self.current_mut() {
            Some(scene) => scene.update(dt, ctx),
            None => Ok(()),
        }
    }

    pub fn render(&mut self, surface: &mut dyn Surface) -> Result<()> {
        match self.current_mut() {
            Some(scene) => scene.render(surface),
            None => Ok(()),
        }
    }

    /// Apply transitions queued on the context, in the order they were made.
    pub fn apply_requests(&mut self, ctx: &mut EngineContext) -> Result<()> {
        for request in ctx.take_scene_requests() {
            match request {
                SceneRequest::Change(name) => self.change_scene(&name, ctx)?,
                SceneRequest::Push(name) => self.push_scene(&name, ctx)?,
                SceneRequest::Pop => self.pop_scene(ctx)?,
            }
        }
        Ok(())
    }

    fn ensure_registered(&self, name: &str) -> Result<()> {
        if self.scenes.contains_key(name) {
            Ok(())
        } else {
            Err(EngineError::SceneNotFound(name.to_string()).into())
        }
    }

    fn current_mut(&mut self) -> Option<&mut (dyn Scene + 'static)> {
        let name = self.stack.last()?;
        self.scenes.get_mut(name).map(|scene| scene.as_mut())
    }

    fn enter_top(&mut self, ctx: &mut EngineContext) -> Result<()> {
        match self.current_mut() {
            Some(scene) => scene.on_enter(ctx),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    type Log = Rc<RefCell<Vec<String>>>;

    struct Recorder {
        name: &'static str,
        log: Log,
    }

    impl Scene for Recorder {
        fn name(&self) -> &str {
            self.name
        }

        fn on_enter(&mut self, _ctx: &mut EngineContext) -> Result<()> {
            self.log.borrow_mut().push(format!("enter {}", self.name));
            Ok(())
        }

        fn on_exit(&mut self, _ctx: &mut EngineContext) -> Result<()> {
            self.log.borrow_mut().push(format!("exit {}", self.name));
            Ok(())
        }

        fn update(&mut self, _dt: f64, ctx: &mut EngineContext) -> Result<()> {
            self.log.borrow_mut().push(format!("update {}", self.name));
            if self.name == "menu" {
                ctx.push_scene("pause");
            }
            Ok(())
        }
    }

    fn manager(names: &[&'static str]) -> (SceneManager, Log) {
        let log: Log = Rc::default();
        let mut manager = SceneManager::new();
        for &name in names {
            manager.add_scene(Box::new(Recorder { name, log: log.clone() }));
        }
        (manager, log)
    }

    #[test]
    fn starts_without_a_current_scene() {
        let (manager, _) = manager(&["a"]);
        assert_eq!(manager.current_scene_name(), None);
        assert_eq!(manager.stack_depth(), 0);
    }

    #[test]
    fn unknown_scene_is_an_error() {
        let (mut manager, log) = manager(&["a"]);
        let mut ctx = EngineContext::headless();
        let err = manager.change_scene("missing", &mut ctx).expect_err("missing scene");
        assert!(matches!(
            err.downcast_ref::<EngineError>(),
            Some(EngineError::SceneNotFound(name)) if name == "missing"
        ));
        assert!(manager.push_scene("missing", &mut ctx).is_err());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn popping_the_last_scene_fails() {
        let (mut manager, _) = manager(&["a"]);
        let mut ctx = EngineContext::headless();
        assert!(manager.pop_scene(&mut ctx).is_err());
        manager.change_scene("a", &mut ctx).expect("change");
        let err = manager.pop_scene(&mut ctx).expect_err("last scene");
        assert!(matches!(err.downcast_ref::<EngineError>(), Some(EngineError::EmptySceneStack)));
        assert_eq!(manager.stack_names(), ["a".to_string()]);
    }

    #[test]
    fn stacked_scenes_cannot_be_removed() {
        let (mut manager, _) = manager(&["a", "b"]);
        let mut ctx = EngineContext::headless();
        manager.change_scene("a", &mut ctx).expect("change");
        assert!(manager.remove_scene("a").is_none());
        assert!(manager.has_scene("a"));
        assert!(manager.remove_scene("b").is_some());
        assert!(!manager.has_scene("b"));
    }

    #[test]
    fn only_the_top_scene_updates_and_requests_apply_after() {
        let (mut manager, log) = manager(&["menu", "pause"]);
        let mut ctx = EngineContext::headless();
        manager.change_scene("menu", &mut ctx).expect("change");
        manager.update(0.016, &mut ctx).expect("update");
        assert_eq!(manager.current_scene_name(), Some("menu"));

        manager.apply_requests(&mut ctx).expect("apply");
        assert_eq!(manager.current_scene_name(), Some("pause"));
        manager.update(0.016, &mut ctx).expect("update");

        assert_eq!(
            *log.borrow(),
            ["enter menu", "update menu", "enter pause", "update pause"]
        );
    }

    #[test]
    fn duplicate_registration_replaces() {
        let (mut manager, log) = manager(&["a"]);
        let other: Log = Rc::default();
        manager.add_scene(Box::new(Recorder { name: "a", log: other.clone() }));
        let mut ctx = EngineContext::headless();
        manager.change_scene("a", &mut ctx).expect("change");
        assert!(log.borrow().is_empty());
        assert_eq!(*other.borrow(), ["enter a"]);
    }
}
