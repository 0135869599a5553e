// src/grass/systems.rs

use bevy::asset::LoadState;
use bevy::gltf::{Gltf, GltfMesh};
use bevy::prelude::*;

use super::config::GrassSettings;
use super::core::TileId;
use super::error::{FieldBuildError, MeshLoadError};
use super::field::{FieldLayout, GrassField};
use super::loading::{settle_loads, LoadSlot};
use super::lod::LodState;
use super::noise::NoiseField;
use super::plugin::{CameraViewChanged, GrassViewer};
use super::render::{BladeMesh, GrassUniforms, UniformSink, TIME_UNIFORM};

/// Layout generated at startup, waiting on its blade meshes.
#[derive(Resource)]
pub struct PendingField {
    layout: Option<FieldLayout>,
    requests: Vec<(String, Handle<Gltf>)>,
    material: Handle<StandardMaterial>,
}

/// The bound field driving LOD and visibility.
#[derive(Resource)]
pub struct ActiveField(pub GrassField<BladeMesh>);

#[derive(Resource, Clone, Debug, Default, PartialEq)]
pub enum GrassFieldStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed(String),
}

/// Marks a spawned merged mesh; `shown_when` is the LOD state it renders in.
#[derive(Component, Clone, Copy, Debug)]
pub struct GrassTileMesh {
    pub tile: TileId,
    pub shown_when: LodState,
}

/// Startup: generate the layout, then request one high and one low mesh per tile.
pub fn start_field_build(
    mut commands: Commands,
    settings: Res<GrassSettings>,
    asset_server: Res<AssetServer>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut status: ResMut<GrassFieldStatus>,
) {
    let noise = NoiseField::new(settings.field_seed());
    let layout = match FieldLayout::generate(&settings, &noise) {
        Ok(layout) => layout,
        Err(e) => {
            error!("Grass: {}", e);
            *status = GrassFieldStatus::Failed(e.to_string());
            return;
        }
    };
    layout.stats().log();

    // Whole glTF files, not labeled sub-assets: only the root handle reports
    // a failed load, and a missing mesh 0 is only visible on the root.
    let requests: Vec<(String, Handle<Gltf>)> = layout
        .mesh_paths(&settings)
        .into_iter()
        .map(|path| {
            let handle = asset_server.load(path.clone());
            (path, handle)
        })
        .collect();

    let material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.30, 0.55, 0.18),
        perceptual_roughness: 1.0,
        metallic: 0.0,
        cull_mode: None,
        double_sided: true,
        ..default()
    });

    info!(
        "Grass: loading {} blade meshes ('{}', '{}')",
        requests.len(),
        settings.high_detail_mesh,
        settings.low_detail_mesh
    );
    commands.insert_resource(PendingField { layout: Some(layout), requests, material });
    *status = GrassFieldStatus::Loading;
}

/// Update: once every request has settled, bind the field or report the failure.
pub fn poll_field_loads(
    mut commands: Commands,
    mut pending: ResMut<PendingField>,
    asset_server: Res<AssetServer>,
    gltfs: Res<Assets<Gltf>>,
    gltf_meshes: Res<Assets<GltfMesh>>,
    meshes: Res<Assets<Mesh>>,
    settings: Res<GrassSettings>,
    viewer: Query<&GlobalTransform, With<GrassViewer>>,
    mut status: ResMut<GrassFieldStatus>,
) {
    let slots = pending.requests.iter().map(|(path, handle)| {
        let state = asset_server.load_state(handle.id());
        let slot = match blade_slot(&state, || first_primitive(handle, &gltfs, &gltf_meshes)) {
            LoadSlot::Ready(mesh) if !meshes.contains(&mesh) => LoadSlot::Pending,
            slot => slot,
        };
        (path.clone(), slot)
    });

    let result = match settle_loads(slots) {
        Ok(None) => return,
        Ok(Some(handles)) => {
            let Some(layout) = pending.layout.take() else { return };
            bind_loaded(layout, &pending, &handles, &meshes, &settings, &viewer)
        }
        Err(e) => Err(FieldBuildError::from(e)),
    };
    commands.remove_resource::<PendingField>();

    match result {
        Ok(field) => {
            info!("Grass: field ready, {} tiles subscribed", field.subscriptions().len());
            commands.insert_resource(ActiveField(field));
            *status = GrassFieldStatus::Ready;
        }
        Err(e) => {
            error!("Grass: {}", e);
            *status = GrassFieldStatus::Failed(e.to_string());
        }
    }
}

/// Map a root glTF load state to a slot. A loaded file without a usable
/// mesh 0 / primitive 0 counts as failed.
fn blade_slot(
    state: &LoadState,
    primitive: impl FnOnce() -> Option<Handle<Mesh>>,
) -> LoadSlot<Handle<Mesh>> {
    match state {
        LoadState::Loaded => match primitive() {
            Some(mesh) => LoadSlot::Ready(mesh),
            None => LoadSlot::Failed("glTF has no mesh 0 / primitive 0".to_string()),
        },
        LoadState::Failed(err) => LoadSlot::Failed(err.to_string()),
        _ => LoadSlot::Pending,
    }
}

fn first_primitive(
    gltf: &Handle<Gltf>,
    gltfs: &Assets<Gltf>,
    gltf_meshes: &Assets<GltfMesh>,
) -> Option<Handle<Mesh>> {
    let mesh = gltfs.get(gltf)?.meshes.first()?;
    let primitive = gltf_meshes.get(mesh)?.primitives.first()?;
    Some(primitive.mesh.clone())
}

fn bind_loaded(
    layout: FieldLayout,
    pending: &PendingField,
    handles: &[Handle<Mesh>],
    meshes: &Assets<Mesh>,
    settings: &GrassSettings,
    viewer: &Query<&GlobalTransform, With<GrassViewer>>,
) -> Result<GrassField<BladeMesh>, FieldBuildError> {
    let mut blades = Vec::with_capacity(handles.len());
    for ((path, _), handle) in pending.requests.iter().zip(handles) {
        let mesh = meshes
            .get(handle)
            .ok_or_else(|| MeshLoadError::new(path.as_str(), "loaded but missing from mesh assets"))?;
        blades.push(BladeMesh::new(path.as_str(), mesh.clone())?);
    }

    let camera = viewer.single().map(GlobalTransform::translation).unwrap_or(Vec3::ZERO);
    GrassField::bind(layout, blades, pending.material.clone(), settings.lod_distance, camera)
}

/// Upload every merged mesh and spawn one entity per tile and detail level.
pub fn spawn_blade_entities(
    mut commands: Commands,
    mut field: ResMut<ActiveField>,
    mut meshes: ResMut<Assets<Mesh>>,
) {
    for lod in field.0.lods_mut() {
        let tile = lod.tile();
        spawn_level(&mut commands, &mut meshes, tile, LodState::Near, lod.high_mut());
        if let Some(low) = lod.low_mut() {
            spawn_level(&mut commands, &mut meshes, tile, LodState::Far, low);
        }
    }
}

fn spawn_level(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    tile: TileId,
    shown_when: LodState,
    blade: &mut BladeMesh,
) {
    let Some(merged) = blade.take_merged() else { return };
    let Some(material) = blade.material().cloned() else {
        warn!("Grass: tile {:?} mesh '{}' has no material; skipping", tile, blade.label());
        return;
    };
    let entity = commands
        .spawn((
            Name::new(format!("Grass tile {} ({:?})", tile.0, shown_when)),
            Mesh3d(meshes.add(merged)),
            MeshMaterial3d(material),
            Transform::default(),
            blade.visibility(),
            GrassTileMesh { tile, shown_when },
        ))
        .id();
    blade.attach_entity(entity);
}

/// Camera-change notifications: one event per viewer transform change.
pub fn emit_camera_view_changed(
    viewer: Query<&GlobalTransform, (With<GrassViewer>, Changed<GlobalTransform>)>,
    mut events: EventWriter<CameraViewChanged>,
) {
    for gt in &viewer {
        events.write(CameraViewChanged(gt.translation()));
    }
}

pub fn apply_lod_on_view_change(
    mut events: EventReader<CameraViewChanged>,
    mut field: ResMut<ActiveField>,
) {
    for ev in events.read() {
        let switched = field.0.on_view_changed(ev.0);
        if !switched.is_empty() {
            debug!("Grass: {} tiles switched LOD", switched.len());
        }
    }
}

/// Mirror enable/material changes from the handles onto their entities.
pub fn sync_blade_entities(
    mut field: ResMut<ActiveField>,
    mut q: Query<(&mut Visibility, &mut MeshMaterial3d<StandardMaterial>), With<GrassTileMesh>>,
) {
    for lod in field.0.lods_mut() {
        sync_one(lod.high_mut(), &mut q);
        if let Some(low) = lod.low_mut() {
            sync_one(low, &mut q);
        }
    }
}

fn sync_one(
    blade: &mut BladeMesh,
    q: &mut Query<(&mut Visibility, &mut MeshMaterial3d<StandardMaterial>), With<GrassTileMesh>>,
) {
    let Some(entity) = blade.entity() else { return };
    let Ok((mut vis, mut mat)) = q.get_mut(entity) else { return };
    if let Some(v) = blade.take_visibility_change() {
        *vis = v;
    }
    if let Some(m) = blade.take_material_change() {
        mat.0 = m;
    }
}

pub fn tick_time_uniform(time: Res<Time>, mut uniforms: ResMut<GrassUniforms>) {
    uniforms.set_float(TIME_UNIFORM, (time.elapsed_secs_f64() * 1000.0) as f32);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grass::plugin::GrassPlugin;
    use bevy::render::mesh::{Indices, PrimitiveTopology};
    use bevy::render::render_asset::RenderAssetUsages;
    use std::time::Duration;

    fn blade() -> Mesh {
        let mut mesh = Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default());
        mesh.insert_attribute(
            Mesh::ATTRIBUTE_POSITION,
            vec![[0.0, 0.0, 0.0], [0.05, 0.0, 0.0], [0.0, 1.0, 0.0]],
        );
        mesh.insert_indices(Indices::U32(vec![0, 1, 2]));
        mesh
    }

    fn bound_field() -> GrassField<BladeMesh> {
        let settings = GrassSettings { blade_count: 400, ..Default::default() };
        let noise = NoiseField::new(settings.field_seed());
        let layout = FieldLayout::generate(&settings, &noise).unwrap();
        let blades = layout
            .mesh_paths(&settings)
            .into_iter()
            .map(|p| BladeMesh::new(p, blade()).unwrap())
            .collect();
        GrassField::bind(layout, blades, Handle::default(), settings.lod_distance, Vec3::ZERO).unwrap()
    }

    fn spawned_meshes(app: &mut App) -> Vec<(GrassTileMesh, Visibility)> {
        let mut q = app.world_mut().query::<(&GrassTileMesh, &Visibility)>();
        q.iter(app.world()).map(|(m, v)| (*m, *v)).collect()
    }

    fn expected_visibility(mesh: &GrassTileMesh, current: LodState) -> Visibility {
        if mesh.shown_when == current {
            Visibility::Inherited
        } else {
            Visibility::Hidden
        }
    }

    #[test]
    fn viewer_move_switches_tiles_through_events() {
        let mut app = App::new();
        app.add_event::<CameraViewChanged>()
            .insert_resource(ActiveField(bound_field()))
            .add_systems(Update, (emit_camera_view_changed, apply_lod_on_view_change).chain());
        let cam = app
            .world_mut()
            .spawn((GrassViewer, GlobalTransform::from_translation(Vec3::ZERO)))
            .id();

        app.update();
        let field = &app.world().resource::<ActiveField>().0;
        assert!(field.lods().iter().all(|l| l.state() == Some(LodState::Near)));

        if let Some(mut gt) = app.world_mut().get_mut::<GlobalTransform>(cam) {
            *gt = GlobalTransform::from_translation(Vec3::new(500.0, 20.0, 500.0));
        }
        app.update();
        let field = &app.world().resource::<ActiveField>().0;
        assert!(field.lods().iter().all(|l| l.state() == Some(LodState::Far)));
        assert!(field.lods().iter().all(|l| !l.high().is_enabled()));
    }

    #[test]
    fn spawned_entities_mirror_lod_visibility() {
        let mut app = App::new();
        app.add_event::<CameraViewChanged>()
            .insert_resource(Assets::<Mesh>::default())
            .insert_resource(ActiveField(bound_field()))
            .add_systems(
                Update,
                (
                    spawn_blade_entities,
                    emit_camera_view_changed,
                    apply_lod_on_view_change,
                    sync_blade_entities,
                )
                    .chain(),
            );
        let cam = app
            .world_mut()
            .spawn((GrassViewer, GlobalTransform::from_translation(Vec3::ZERO)))
            .id();

        app.update();
        let spawned = spawned_meshes(&mut app);
        assert_eq!(spawned.len(), 8);
        for tile in 0..4 {
            let levels: Vec<LodState> = spawned
                .iter()
                .filter(|(m, _)| m.tile == TileId(tile))
                .map(|(m, _)| m.shown_when)
                .collect();
            assert_eq!(levels.len(), 2);
            assert!(levels.contains(&LodState::Near) && levels.contains(&LodState::Far));
        }
        for (mesh, vis) in &spawned {
            assert_eq!(*vis, expected_visibility(mesh, LodState::Near), "{mesh:?}");
        }
        assert_eq!(app.world().resource::<Assets<Mesh>>().len(), 8);

        if let Some(mut gt) = app.world_mut().get_mut::<GlobalTransform>(cam) {
            *gt = GlobalTransform::from_translation(Vec3::new(500.0, 20.0, 500.0));
        }
        app.update();
        let spawned = spawned_meshes(&mut app);
        assert_eq!(spawned.len(), 8);
        for (mesh, vis) in &spawned {
            assert_eq!(*vis, expected_visibility(mesh, LodState::Far), "{mesh:?}");
        }
    }

    #[test]
    fn root_state_maps_to_slot() {
        let mesh: Handle<Mesh> = Handle::default();
        assert_eq!(blade_slot(&LoadState::Loaded, || Some(mesh.clone())), LoadSlot::Ready(mesh.clone()));
        assert!(matches!(blade_slot(&LoadState::Loaded, || None), LoadSlot::Failed(_)));
        assert_eq!(blade_slot(&LoadState::Loading, || Some(mesh.clone())), LoadSlot::Pending);
        assert_eq!(blade_slot(&LoadState::NotLoaded, || None), LoadSlot::Pending);
    }

    #[test]
    fn unloadable_meshes_fail_the_build() {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, AssetPlugin::default()))
            .init_asset::<Mesh>()
            .init_asset::<StandardMaterial>()
            .init_asset::<Gltf>()
            .init_asset::<GltfMesh>()
            .insert_resource(GrassSettings {
                blade_count: 400,
                high_detail_mesh: "grass/absent-high.glb".to_string(),
                low_detail_mesh: "grass/absent-low.glb".to_string(),
                ..Default::default()
            })
            .add_plugins(GrassPlugin);

        for _ in 0..1_000 {
            app.update();
            if *app.world().resource::<GrassFieldStatus>() != GrassFieldStatus::Loading {
                break;
            }
            std::thread::sleep(Duration::from_millis(2));
        }

        let status = app.world().resource::<GrassFieldStatus>().clone();
        let GrassFieldStatus::Failed(reason) = status else {
            panic!("expected a failed build, got {status:?}");
        };
        assert!(reason.contains("grass/absent-"), "{reason}");
        assert!(!app.world().contains_resource::<ActiveField>());
        assert!(!app.world().contains_resource::<PendingField>());
    }

    #[test]
    fn time_uniform_is_in_milliseconds() {
        let mut app = App::new();
        app.init_resource::<GrassUniforms>()
            .insert_resource(Time::<()>::default())
            .add_systems(Update, tick_time_uniform);
        app.world_mut().resource_mut::<Time>().advance_by(Duration::from_millis(250));

        app.update();
        assert_eq!(app.world().resource::<GrassUniforms>().get(TIME_UNIFORM), Some(250.0));
    }

    #[test]
    fn time_uniform_keeps_millisecond_resolution_after_hours() {
        let mut app = App::new();
        app.init_resource::<GrassUniforms>()
            .insert_resource(Time::<()>::default())
            .add_systems(Update, tick_time_uniform);
        // 3h plus 7ms.
        app.world_mut().resource_mut::<Time>().advance_by(Duration::from_millis(10_800_007));

        app.update();
        assert_eq!(app.world().resource::<GrassUniforms>().get(TIME_UNIFORM), Some(10_800_007.0));
    }
}
