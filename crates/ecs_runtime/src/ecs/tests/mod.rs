//! Registry scenario tests
//!
//! These drive a [`World`] through whole system lifecycles and check the
//! order in which events, system callbacks and module releases happen.

use crate::ecs::components::{Label, Lifetime, Transform};
use crate::ecs::events::{
    ComponentAttached, ComponentDetached, EntityCreated, EntityDestroyed, Notice, SystemDestroyed, SystemLoaded,
};
use crate::ecs::{Blank, EcsError, EntityBuilder, EntityId, EntityKind, EntityMut, Prefab, Tenure, World};
use crate::events::Event;
use crate::plugin::{ModuleArgs, ModuleLoadError};
use crate::testing::{Journal, Probe, StaticLoader};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Prefab with one component attached during construction
struct Drone;

impl Prefab for Drone {
    const KIND: EntityKind = EntityKind::new("Drone");

    fn build(&mut self, entity: &mut EntityBuilder) -> Result<(), EcsError> {
        entity.attach(Label::new("drone"))?;
        Ok(())
    }
}

/// Prefab whose post-build hook attaches a second component
struct Beacon;

impl Prefab for Beacon {
    const KIND: EntityKind = EntityKind::new("Beacon");

    fn build(&mut self, entity: &mut EntityBuilder) -> Result<(), EcsError> {
        entity.attach(Label::new("beacon"))?;
        Ok(())
    }

    fn after_build(&mut self, entity: &mut EntityMut<'_>) -> Result<(), EcsError> {
        entity.attach(Lifetime::new(2.0))?;
        Ok(())
    }
}

/// Prefab whose post-build hook fails
struct Faulty;

impl Prefab for Faulty {
    const KIND: EntityKind = EntityKind::new("Faulty");

    fn build(&mut self, entity: &mut EntityBuilder) -> Result<(), EcsError> {
        entity.attach(Label::new("faulty"))?;
        Ok(())
    }

    fn after_build(&mut self, entity: &mut EntityMut<'_>) -> Result<(), EcsError> {
        entity.attach(Label::new("again"))?;
        Ok(())
    }
}

/// Journal every event of type `E` under an observer that is not a system
fn watch<E: Event>(world: &mut World, journal: &Journal, describe: impl Fn(&E) -> String + 'static) {
    let observer = world.events_mut().register_subscriber();
    let journal = journal.clone();
    world
        .events_mut()
        .require::<E, _>(observer, move |event| journal.push(describe(event)));
}

fn watch_lifecycle(world: &mut World, journal: &Journal) {
    watch::<EntityCreated<Drone>>(world, journal, |e| format!("created {}", e.entity));
    watch::<ComponentAttached<Label>>(world, journal, |e| format!("attached {} {}", e.entity, e.component));
    watch::<ComponentDetached<Label>>(world, journal, |e| format!("detached {} {}", e.entity, e.component));
    watch::<EntityDestroyed>(world, journal, |e| format!("destroyed {} {}", e.entity, e.kind));
    watch::<SystemDestroyed>(world, journal, |e| format!("system destroyed {}", e.name));
}

/// Spawn with a system context and hand back the id
fn spawn_saved(world: &mut World, journal: &Journal, name: &str) -> EntityId {
    let slot = Rc::new(Cell::new(None));
    let out = Rc::clone(&slot);
    world
        .add_system(Probe::new(name, journal).on_setup(move |world| {
            out.set(Some(world.create(Drone)?));
            Ok(())
        }))
        .unwrap();
    slot.get().unwrap()
}

#[test]
fn test_setup_entity_is_announced_before_systems_run() {
    let journal = Journal::new();
    let mut world = World::with_loader(Box::new(StaticLoader::new(&journal)));
    watch_lifecycle(&mut world, &journal);

    world
        .add_system(Probe::new("A", &journal).on_setup(|world| {
            world.create_scoped(Drone)?;
            Ok(())
        }))
        .unwrap();
    world.add_system(Probe::new("B", &journal)).unwrap();
    world.tick();

    assert_eq!(
        journal.lines(),
        vec!["setup A", "created 0", "attached 0 drone", "setup B", "run A", "run B"]
    );
}

#[test]
fn test_removal_requested_mid_tick_is_deferred() {
    crate::foundation::logging::init_for_tests();
    let journal = Journal::new();
    let mut world = World::with_loader(Box::new(StaticLoader::new(&journal)));
    watch_lifecycle(&mut world, &journal);

    world
        .add_system(
            Probe::new("A", &journal)
                .on_setup(|world| {
                    world.create_scoped(Drone)?;
                    Ok(())
                })
                .on_run(|world| {
                    world.remove_system("A");
                    Ok(())
                }),
        )
        .unwrap();
    world.add_system(Probe::new("B", &journal)).unwrap();
    journal.clear();

    assert_eq!(world.tick(), 2);

    assert_eq!(
        journal.lines(),
        vec![
            "run A",
            "run B",
            "detached 0 drone",
            "destroyed 0 Drone",
            "system destroyed A",
            "teardown A",
            "drop A",
        ]
    );
    assert_eq!(world.system_names(), vec!["B"]);
    assert_eq!(world.entity_count(), 0);
    assert!(world.query::<Label>().is_empty());
}

#[test]
fn test_systems_added_mid_tick_wait_for_the_next_tick() {
    let journal = Journal::new();
    let mut world = World::default();
    let spawned = Rc::new(Cell::new(false));
    let flag = Rc::clone(&spawned);
    let child_journal = journal.clone();

    world
        .add_system(Probe::new("parent", &journal).on_run(move |world| {
            if !flag.replace(true) {
                world.add_system(Probe::new("child", &child_journal))?;
            }
            Ok(())
        }))
        .unwrap();
    journal.clear();

    assert_eq!(world.tick(), 1);
    assert_eq!(world.tick(), 2);
    assert_eq!(journal.lines(), vec!["run parent", "setup child", "run parent", "run child"]);
}

#[test]
fn test_duplicate_name_is_rejected_without_side_effects() {
    let journal = Journal::new();
    let mut world = World::default();
    let notices = Journal::new();
    watch::<Notice>(&mut world, &notices, |e| e.message.clone());

    let first = world.add_system(Probe::new("physics", &journal)).unwrap();
    let second = world.add_system(Probe::new("physics", &journal)).unwrap();

    assert!(first.loaded);
    assert!(!second.loaded);
    assert_eq!(second.name, "physics");
    assert_eq!(world.system_count(), 1);
    assert_eq!(notices.lines(), vec!["[physics] loaded.", "[physics] already loaded."]);
    assert_eq!(journal.lines(), vec!["setup physics", "drop physics"]);

    world.remove_system("physics");
    world.flush_removals();
    assert_eq!(journal.lines().iter().filter(|l| *l == "teardown physics").count(), 1);
}

#[test]
fn test_removal_is_deduplicated() {
    let journal = Journal::new();
    let mut world = World::default();
    world.add_system(Probe::new("A", &journal)).unwrap();

    assert!(world.remove_system("A"));
    assert!(!world.remove_system("A"));
    assert!(world.is_pending_removal("A"));
    assert!(world.has_system("A"));

    world.flush_removals();

    assert!(!world.has_system("A"));
    assert!(!world.is_pending_removal("A"));
    assert_eq!(journal.lines().iter().filter(|l| *l == "teardown A").count(), 1);
}

#[test]
fn test_missing_removal_target_is_skipped() {
    let journal = Journal::new();
    let mut world = World::default();
    world.add_system(Probe::new("B", &journal)).unwrap();

    world.remove_system("ghost");
    world.remove_system("B");
    world.flush_removals();

    assert_eq!(world.system_count(), 0);
    assert!(journal.lines().contains(&"teardown B".to_string()));
}

#[test]
fn test_loading_same_path_twice() {
    let journal = Journal::new();
    let loader = StaticLoader::new(&journal).register("pulse", {
        let journal = journal.clone();
        move |_| Box::new(Probe::new("pulse", &journal))
    });
    let mut world = World::with_loader(Box::new(loader));

    let first = world.load_system("mods/pulse.so", &ModuleArgs::new()).unwrap();
    let second = world.load_system("mods/pulse.so", &ModuleArgs::new()).unwrap();

    assert!(first.loaded);
    assert!(!second.loaded);
    assert_eq!(world.system_count(), 1);
    assert_eq!(journal.lines(), vec!["open pulse", "setup pulse"]);
}

#[test]
fn test_module_is_released_after_teardown() {
    let journal = Journal::new();
    let loader = StaticLoader::new(&journal).register("pulse", {
        let journal = journal.clone();
        move |_| {
            Box::new(Probe::new("pulse", &journal).on_setup(|world| {
                world.create_scoped(Drone)?;
                Ok(())
            }))
        }
    });
    let mut world = World::with_loader(Box::new(loader));
    watch::<SystemDestroyed>(&mut world, &journal, |e| format!("system destroyed {}", e.name));

    world.load_system("mods/pulse.so", &ModuleArgs::new()).unwrap();
    world.remove_system("pulse");
    world.flush_removals();

    assert_eq!(
        journal.lines(),
        vec![
            "open pulse",
            "setup pulse",
            "system destroyed pulse",
            "teardown pulse",
            "drop pulse",
            "close pulse",
        ]
    );

    // The path is free again once the module was released.
    let reloaded = world.load_system("mods/pulse.so", &ModuleArgs::new()).unwrap();
    assert!(reloaded.loaded);
}

#[test]
fn test_module_kept_mapped_while_its_saved_entities_live() {
    let journal = Journal::new();
    let loader = StaticLoader::new(&journal).register("spawner", {
        let journal = journal.clone();
        move |_| {
            Box::new(Probe::new("spawner", &journal).on_setup(|world| {
                world.create(Drone)?;
                Ok(())
            }))
        }
    });
    let mut world = World::with_loader(Box::new(loader));

    world.load_system("mods/spawner.so", &ModuleArgs::new()).unwrap();
    world.remove_system("spawner");
    world.flush_removals();

    assert!(!world.has_system("spawner"));
    assert_eq!(world.saved_count(), 1);
    assert_eq!(journal.position("close spawner"), None);

    // The path itself is free again even though the old mapping is kept.
    assert!(world.load_system("mods/spawner.so", &ModuleArgs::new()).unwrap().loaded);

    drop(world);
    let closes = journal.lines().iter().filter(|line| *line == "close spawner").count();
    assert_eq!(closes, 2);
}

#[test]
fn test_module_load_failure_leaves_world_untouched() {
    let journal = Journal::new();
    let mut world = World::with_loader(Box::new(StaticLoader::new(&journal)));

    let result = world.load_system("mods/unknown.so", &ModuleArgs::new());

    assert!(matches!(
        result,
        Err(EcsError::ModuleLoad(ModuleLoadError::MissingSymbol { .. }))
    ));
    assert_eq!(world.system_count(), 0);
    assert!(journal.lines().is_empty());
}

#[test]
fn test_rejected_module_is_released() {
    let journal = Journal::new();
    let loader = StaticLoader::new(&journal).register("physics", {
        let journal = journal.clone();
        move |_| Box::new(Probe::new("physics", &journal))
    });
    let mut world = World::with_loader(Box::new(loader));
    world.add_system(Probe::new("physics", &journal)).unwrap();
    journal.clear();

    let status = world.load_system("mods/physics.so", &ModuleArgs::new()).unwrap();

    assert!(!status.loaded);
    assert_eq!(journal.lines(), vec!["open physics", "drop physics", "close physics"]);
}

#[test]
fn test_saved_entity_outlives_its_creator() {
    let journal = Journal::new();
    let mut world = World::default();
    let id = spawn_saved(&mut world, &journal, "A");

    assert_eq!(world.creator_of(id), Some("A".to_string()));
    assert_eq!(world.owner_of(id), None);

    world.remove_system("A");
    world.flush_removals();

    assert!(world.contains(id));
    assert_eq!(world.saved_count(), 1);
    assert!(world.destroy(id));
    assert!(!world.contains(id));
}

#[test]
fn test_double_destroy_is_harmless() {
    let journal = Journal::new();
    let mut world = World::default();
    let id = spawn_saved(&mut world, &journal, "A");

    assert!(world.destroy(id));
    assert!(!world.destroy(id));
    assert!(!world.destroy(EntityId::new(999)));
}

#[test]
fn test_early_destroy_of_temporary_entity() {
    let journal = Journal::new();
    let mut world = World::default();
    let slot = Rc::new(Cell::new(None));
    let out = Rc::clone(&slot);
    world
        .add_system(Probe::new("A", &journal).on_setup(move |world| {
            out.set(Some(world.create_scoped(Drone)?));
            world.create_scoped(Drone)?;
            Ok(())
        }))
        .unwrap();
    let early = slot.get().unwrap();

    assert_eq!(world.owner_of(early), Some("A".to_string()));
    assert_eq!(world.leased_by("A").len(), 2);
    assert!(world.destroy(early));
    assert_eq!(world.leased_by("A").len(), 1);

    let notices = Journal::new();
    watch::<Notice>(&mut world, &notices, |e| e.message.clone());
    world.remove_system("A");
    world.flush_removals();

    assert_eq!(world.entity_count(), 0);
    assert_eq!(notices.lines(), vec!["[A] shutdown. Killed 1 entities."]);
}

#[test]
fn test_creation_requires_a_system() {
    let mut world = World::default();

    assert!(matches!(world.create(Blank), Err(EcsError::NoActiveSystem { operation: "create" })));
    assert!(matches!(
        world.create_scoped(Blank),
        Err(EcsError::NoActiveSystem { operation: "create_scoped" })
    ));
    assert!(matches!(
        world.subscribe::<Notice, _>(|_| {}),
        Err(EcsError::NoActiveSystem { .. })
    ));
    assert_eq!(world.entity_count(), 0);
}

#[test]
fn test_component_attach_and_detach() {
    let journal = Journal::new();
    let mut world = World::default();
    watch_lifecycle(&mut world, &journal);
    let id = spawn_saved(&mut world, &journal, "A");
    journal.clear();

    assert!(matches!(
        world.attach(id, Label::new("second")),
        Err(EcsError::DuplicateComponent { .. })
    ));
    assert_eq!(world.get::<Label>(id).unwrap().as_str(), "drone");

    assert!(!world.detach::<Transform>(id).unwrap());
    assert!(world.detach::<Label>(id).unwrap());
    assert!(!world.detach::<Label>(id).unwrap());
    assert!(!world.has::<Label>(id));
    assert!(world.query::<Label>().is_empty());
    assert!(matches!(world.get::<Label>(id), Err(EcsError::ComponentNotFound { .. })));

    world.attach(id, Label::new("renamed")).unwrap();
    assert_eq!(world.query_entities::<Label>(), vec![id]);
    assert_eq!(journal.lines(), vec!["detached 0 drone", "attached 0 renamed"]);
}

#[test]
fn test_operations_on_missing_entity() {
    let mut world = World::default();
    let ghost = EntityId::new(42);

    assert!(matches!(world.attach(ghost, Label::new("x")), Err(EcsError::EntityNotFound(_))));
    assert!(matches!(world.detach::<Label>(ghost), Err(EcsError::EntityNotFound(_))));
    assert!(!world.has::<Label>(ghost));
    assert!(world.entity_mut(ghost).is_none());
}

#[test]
fn test_query_is_ordered_by_entity_id() {
    let journal = Journal::new();
    let mut world = World::default();
    world
        .add_system(Probe::new("A", &journal).on_setup(|world| {
            for name in ["c", "a", "b"] {
                let id = world.create(Blank)?;
                world.attach(id, Label::new(name))?;
            }
            Ok(())
        }))
        .unwrap();

    let labels: Vec<(u32, &str)> = world
        .query::<Label>()
        .into_iter()
        .map(|(id, label)| (id.id(), label.as_str()))
        .collect();

    assert_eq!(labels, vec![(0, "c"), (1, "a"), (2, "b")]);
}

#[test]
fn test_after_build_runs_once_entity_is_live() {
    let journal = Journal::new();
    let mut world = World::default();
    let slot = Rc::new(Cell::new(None));
    let out = Rc::clone(&slot);
    world
        .add_system(Probe::new("A", &journal).on_setup(move |world| {
            out.set(Some(world.create(Beacon)?));
            Ok(())
        }))
        .unwrap();
    let id = slot.get().unwrap();

    let entity = world.entity(id).unwrap();
    assert_eq!(entity.kind().name(), "Beacon");
    assert_eq!(entity.component_count(), 2);
    assert_eq!(world.query_entities::<Lifetime>(), vec![id]);
}

#[test]
fn test_failed_after_build_destroys_entity() {
    let journal = Journal::new();
    let mut world = World::default();
    let outcome = Rc::new(RefCell::new(None));
    let out = Rc::clone(&outcome);
    world
        .add_system(Probe::new("A", &journal).on_setup(move |world| {
            *out.borrow_mut() = Some(world.create(Faulty).map(|_| ()));
            Ok(())
        }))
        .unwrap();

    assert!(matches!(
        outcome.borrow().as_ref(),
        Some(Err(EcsError::DuplicateComponent { .. }))
    ));
    assert_eq!(world.entity_count(), 0);
    assert_eq!(world.saved_count(), 0);
}

#[test]
fn test_setup_failure_rolls_back() {
    let journal = Journal::new();
    let mut world = World::default();
    let heard = Rc::new(Cell::new(0));
    let ear = Rc::clone(&heard);

    let result = world.add_system(Probe::new("broken", &journal).on_setup(move |world| {
        world.create_scoped(Drone)?;
        let ear = Rc::clone(&ear);
        world.subscribe::<SystemLoaded, _>(move |_| ear.set(ear.get() + 1))?;
        Err(EcsError::system("broken", "no configuration"))
    }));

    assert!(matches!(result, Err(EcsError::System { .. })));
    assert!(!world.has_system("broken"));
    assert_eq!(world.entity_count(), 0);
    assert_eq!(world.temporary_count(), 0);

    world.add_system(Probe::new("healthy", &journal)).unwrap();
    assert_eq!(heard.get(), 0);
}

#[test]
fn test_subscriptions_are_revoked_on_teardown() {
    let journal = Journal::new();
    let mut world = World::default();
    let heard = Rc::new(Cell::new(0));
    let ear = Rc::clone(&heard);
    world
        .add_system(Probe::new("listener", &journal).on_setup(move |world| {
            let ear = Rc::clone(&ear);
            world.subscribe::<Notice, _>(move |_| ear.set(ear.get() + 1))?;
            Ok(())
        }))
        .unwrap();

    world.notice("one");
    world.remove_system("listener");
    world.flush_removals();
    let heard_before = heard.get();
    world.notice("two");

    assert_eq!(heard_before, 2);
    assert_eq!(heard.get(), heard_before);
}

#[test]
fn test_run_failure_does_not_stop_the_tick() {
    crate::foundation::logging::init_for_tests();
    let journal = Journal::new();
    let mut world = World::default();
    world
        .add_system(Probe::new("failing", &journal).on_run(|_| Err(EcsError::system("failing", "boom"))))
        .unwrap();
    world.add_system(Probe::new("after", &journal)).unwrap();
    journal.clear();

    assert_eq!(world.tick(), 2);
    assert_eq!(journal.lines(), vec!["run failing", "run after"]);
    assert_eq!(world.system_count(), 2);
}

#[test]
fn test_current_system_is_tracked() {
    let journal = Journal::new();
    let mut world = World::default();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let during_setup = Rc::clone(&seen);
    let during_run = Rc::clone(&seen);
    world
        .add_system(
            Probe::new("A", &journal)
                .on_setup(move |world| {
                    during_setup.borrow_mut().push(world.current_system().map(str::to_string));
                    Ok(())
                })
                .on_run(move |world| {
                    during_run.borrow_mut().push(world.current_system().map(str::to_string));
                    assert_eq!(world.tick(), 0);
                    Ok(())
                }),
        )
        .unwrap();
    world.tick();

    assert_eq!(*seen.borrow(), vec![Some("A".to_string()), Some("A".to_string())]);
    assert_eq!(world.current_system(), None);
}

#[test]
fn test_tenure_reports_regime() {
    let journal = Journal::new();
    let mut world = World::default();
    let ids = Rc::new(RefCell::new(Vec::new()));
    let out = Rc::clone(&ids);
    world
        .add_system(Probe::new("A", &journal).on_setup(move |world| {
            out.borrow_mut().push(world.create(Blank)?);
            out.borrow_mut().push(world.create_scoped(Blank)?);
            Ok(())
        }))
        .unwrap();
    let ids = ids.borrow();

    assert_eq!(world.tenure(ids[0]), Some(Tenure::Saved { creator: Some("A".into()) }));
    assert_eq!(world.tenure(ids[1]), Some(Tenure::Temporary { owner: "A".into() }));
    assert_eq!(world.temporary_count(), 1);
}
