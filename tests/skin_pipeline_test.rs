mod common;

use std::sync::Arc;

use crate::common::test_utils::{
    FakeHttp, RecordingStatus, SKIN_URL, identity_json, identity_url, known_player, materials,
    png, profile_json, profile_url, sample_model, skin_png, textures_value,
};
use flow_avatar::{
    data_structures::{
        material::{Emissive, Material},
        scene_graph::SceneNode,
        texture::TextureOptions,
    },
    skin::{
        Endpoints, SkinError, SkinPipeline, SkinSettings, SkinStage, apply::is_eye,
        load_skin_texture, probe_handle,
    },
    status::Status,
};

#[tokio::test]
async fn known_player_gets_skin_on_every_mesh() {
    let pipeline = SkinPipeline::new(known_player("OrpoPro", "abc123"));
    let mut model = sample_model();
    let mut status = RecordingStatus::default();

    let outcome = pipeline.apply_skin(&mut model, "OrpoPro", &mut status).await;

    assert!(outcome.is_success(), "{:?}", outcome.error());
    assert_eq!(outcome.stage, SkinStage::Done);
    assert_eq!(outcome.meshes, 4);
    let texture = outcome.texture.expect("texture of a successful run");
    assert_eq!(texture.dimensions(), (64, 64));
    assert_eq!(texture.options(), TextureOptions::pixel_art());

    for (name, material) in materials(&model) {
        assert_ne!(material.name, "original", "{name} kept its old material");
        let shown = material.texture.as_ref().expect("textured");
        assert!(Arc::ptr_eq(shown, &texture), "{name} has its own texture copy");
        assert_eq!(material.base_color, [1.0; 3]);
        if is_eye(&name) {
            assert_eq!(material.emissive, Some(Emissive::eye_glow()), "{name}");
        } else {
            assert_eq!(material.emissive, None, "{name}");
        }
    }

    assert_eq!(
        pipeline.http().requests(),
        vec![identity_url("OrpoPro"), profile_url("abc123"), SKIN_URL.to_string()]
    );
    assert_eq!(
        status.history.first(),
        Some(&Status::Message("Loading skin for OrpoPro...".into()))
    );
    assert_eq!(status.last(), Some(&Status::Hidden));
}

#[tokio::test]
async fn unknown_player_falls_back_on_every_mesh() {
    let pipeline = SkinPipeline::new(FakeHttp::new());
    let mut model = sample_model();
    let mut status = RecordingStatus::default();

    let outcome = pipeline.apply_skin(&mut model, "ghostuser", &mut status).await;

    assert_eq!(outcome.stage, SkinStage::FallbackApplied);
    assert_eq!(outcome.failed_at(), Some(SkinStage::Resolving));
    assert_eq!(
        outcome.error(),
        Some(&SkinError::IdentityNotFound("ghostuser".into()))
    );
    assert_eq!(outcome.meshes, 4);
    assert!(outcome.texture.is_none());

    let fallback = Material::fallback();
    for (name, material) in materials(&model) {
        assert_eq!(material.name, "fallback", "{name}");
        assert_eq!(material.base_color, fallback.base_color);
        assert!(material.texture.is_none());
        assert!(material.emissive.is_none(), "{name} glows without a skin");
    }

    assert_eq!(pipeline.http().requests(), vec![identity_url("ghostuser")]);
    assert_eq!(
        status.last(),
        Some(&Status::Error("Skin error: Player \"ghostuser\" not found".into()))
    );
}

#[tokio::test]
async fn missing_profile_is_reported_with_the_id() {
    let http = FakeHttp::new().route(identity_url("OrpoPro"), 200, identity_json("abc123", "OrpoPro"));
    let pipeline = SkinPipeline::new(http);
    let mut model = sample_model();

    let outcome = pipeline
        .apply_skin(&mut model, "OrpoPro", &mut RecordingStatus::default())
        .await;

    assert_eq!(outcome.failed_at(), Some(SkinStage::FetchingProfile));
    assert_eq!(
        outcome.error(),
        Some(&SkinError::ProfileNotFound("abc123".into()))
    );
    assert_eq!(outcome.stage, SkinStage::FallbackApplied);
}

#[tokio::test]
async fn profile_without_textures_property_falls_back() {
    let http = FakeHttp::new()
        .route(identity_url("OrpoPro"), 200, identity_json("abc123", "OrpoPro"))
        .route(profile_url("abc123"), 200, profile_json("abc123", "OrpoPro", &[]));
    let pipeline = SkinPipeline::new(http);
    let mut model = sample_model();
    let mut status = RecordingStatus::default();

    let outcome = pipeline.apply_skin(&mut model, "OrpoPro", &mut status).await;

    assert_eq!(outcome.error(), Some(&SkinError::MissingTextureProperty));
    assert_eq!(outcome.failed_at(), Some(SkinStage::Decoding));
    assert_eq!(pipeline.http().requests().len(), 2);
    assert_eq!(
        status.last(),
        Some(&Status::Error("Skin error: No texture data found".into()))
    );
    assert!(materials(&model).iter().all(|(_, m)| m.name == "fallback"));
}

#[tokio::test]
async fn manifest_without_skin_slot_never_downloads() {
    let http = FakeHttp::new()
        .route(identity_url("OrpoPro"), 200, identity_json("abc123", "OrpoPro"))
        .route(
            profile_url("abc123"),
            200,
            profile_json("abc123", "OrpoPro", &[("textures", textures_value(None).as_str())]),
        )
        .route(SKIN_URL, 200, skin_png());
    let pipeline = SkinPipeline::new(http);
    let mut model = sample_model();

    let outcome = pipeline
        .apply_skin(&mut model, "OrpoPro", &mut RecordingStatus::default())
        .await;

    assert_eq!(outcome.error(), Some(&SkinError::MissingSkinSlot));
    assert_eq!(outcome.failed_at(), Some(SkinStage::Decoding));
    assert!(!pipeline.http().was_requested(SKIN_URL));
    assert!(materials(&model).iter().all(|(_, m)| !m.is_textured()));
}

#[tokio::test]
async fn garbage_manifest_is_malformed() {
    let http = FakeHttp::new()
        .route(identity_url("OrpoPro"), 200, identity_json("abc123", "OrpoPro"))
        .route(
            profile_url("abc123"),
            200,
            profile_json("abc123", "OrpoPro", &[("textures", "not base64 at all!")]),
        );
    let pipeline = SkinPipeline::new(http);

    let result = pipeline
        .fetch_skin("OrpoPro", &mut RecordingStatus::default())
        .await;

    let err = result.expect_err("manifest should not decode");
    assert_eq!(err.stage, SkinStage::Decoding);
    assert!(matches!(err.error, SkinError::MalformedManifest(_)), "{err:?}");
}

#[tokio::test]
async fn skin_texture_is_sampled_as_pixel_art() {
    let http = FakeHttp::new().route(SKIN_URL, 200, png(64, 32));

    let texture = load_skin_texture(&http, SKIN_URL).await.unwrap();

    let options = texture.options();
    assert_eq!(options.mag_filter, wgpu::FilterMode::Nearest);
    assert_eq!(options.min_filter, wgpu::FilterMode::Nearest);
    assert!(!options.flip_y);
    assert_eq!(texture.dimensions(), (64, 32));
    assert_eq!(texture.label(), SKIN_URL);
}

#[tokio::test]
async fn unreachable_or_undecodable_texture_fails_to_load() {
    let base = |body: Vec<u8>, status: u16| {
        FakeHttp::new()
            .route(identity_url("OrpoPro"), 200, identity_json("abc123", "OrpoPro"))
            .route(
                profile_url("abc123"),
                200,
                profile_json("abc123", "OrpoPro", &[("textures", textures_value(Some(SKIN_URL)).as_str())]),
            )
            .route(SKIN_URL, status, body)
    };

    for http in [base(Vec::new(), 404), base(b"<html>nope</html>".to_vec(), 200)] {
        let pipeline = SkinPipeline::new(http);
        let mut model = sample_model();
        let outcome = pipeline
            .apply_skin(&mut model, "OrpoPro", &mut RecordingStatus::default())
            .await;

        assert_eq!(outcome.failed_at(), Some(SkinStage::LoadingTexture));
        match outcome.error() {
            Some(SkinError::TextureLoad { url, .. }) => assert_eq!(url, SKIN_URL),
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(outcome.stage, SkinStage::FallbackApplied);
    }
}

#[tokio::test]
async fn transport_failure_is_not_retried() {
    let http = FakeHttp::new().broken(identity_url("OrpoPro"));
    let pipeline = SkinPipeline::new(http);
    let mut model = sample_model();

    let outcome = pipeline
        .apply_skin(&mut model, "OrpoPro", &mut RecordingStatus::default())
        .await;

    assert!(matches!(outcome.error(), Some(SkinError::Transport(_))));
    assert_eq!(outcome.failed_at(), Some(SkinStage::Resolving));
    assert_eq!(pipeline.http().requests().len(), 1);
}

#[tokio::test]
async fn blank_handle_sends_no_request() {
    let pipeline = SkinPipeline::new(FakeHttp::new());
    let mut model = sample_model();

    for handle in ["", "   "] {
        let outcome = pipeline
            .apply_skin(&mut model, handle, &mut RecordingStatus::default())
            .await;
        assert!(matches!(outcome.error(), Some(SkinError::IdentityNotFound(_))));
    }
    assert!(pipeline.http().requests().is_empty());
}

#[tokio::test]
async fn running_twice_yields_the_same_assignment() {
    let pipeline = SkinPipeline::new(known_player("OrpoPro", "abc123"));
    let mut model = sample_model();

    pipeline
        .apply_skin(&mut model, "OrpoPro", &mut RecordingStatus::default())
        .await;
    let first = materials(&model);
    pipeline
        .apply_skin(&mut model, "OrpoPro", &mut RecordingStatus::default())
        .await;
    let second = materials(&model);

    assert_eq!(first.len(), second.len());
    for ((name_a, a), (name_b, b)) in first.iter().zip(&second) {
        assert_eq!(name_a, name_b);
        assert_eq!(a.name, b.name);
        assert_eq!(a.emissive, b.emissive);
        assert_eq!(a.roughness, b.roughness);
        assert_eq!(a.metalness, b.metalness);
        let (ta, tb) = (a.texture.as_ref().unwrap(), b.texture.as_ref().unwrap());
        assert_eq!(ta.pixels(), tb.pixels());
    }
}

async fn skinned_then_failed(settings: SkinSettings) -> (SceneNode, SkinStage) {
    let http = known_player("OrpoPro", "abc123");
    let pipeline = SkinPipeline::new(http).with_settings(settings);
    let mut model = sample_model();

    let first = pipeline
        .apply_skin(&mut model, "OrpoPro", &mut RecordingStatus::default())
        .await;
    assert!(first.is_success());

    let second = pipeline
        .apply_skin(&mut model, "ghostuser", &mut RecordingStatus::default())
        .await;
    (model, second.stage)
}

#[tokio::test]
async fn failure_after_success_reverts_to_fallback() {
    let (model, stage) = skinned_then_failed(SkinSettings::default()).await;

    assert_eq!(stage, SkinStage::FallbackApplied);
    assert!(materials(&model).iter().all(|(_, m)| m.name == "fallback"));
}

#[tokio::test]
async fn failure_after_success_can_keep_the_last_skin() {
    let settings = SkinSettings {
        keep_last_good_on_failure: true,
    };
    let (model, stage) = skinned_then_failed(settings).await;

    assert_eq!(stage, SkinStage::Failed);
    assert!(materials(&model).iter().all(|(_, m)| m.is_textured()));
}

#[tokio::test]
async fn keep_last_good_still_falls_back_without_a_skin() {
    let pipeline = SkinPipeline::new(FakeHttp::new()).with_settings(SkinSettings {
        keep_last_good_on_failure: true,
    });
    let mut model = sample_model();

    let outcome = pipeline
        .apply_skin(&mut model, "ghostuser", &mut RecordingStatus::default())
        .await;

    assert_eq!(outcome.stage, SkinStage::FallbackApplied);
    assert!(materials(&model).iter().all(|(_, m)| m.name == "fallback"));
}

#[tokio::test]
async fn reload_announces_itself() {
    let pipeline = SkinPipeline::new(known_player("OrpoPro", "abc123"));
    let mut model = sample_model();
    let mut status = RecordingStatus::default();

    let outcome = pipeline.reload(&mut model, "OrpoPro", &mut status).await;

    assert!(outcome.is_success());
    assert_eq!(
        status.history,
        vec![
            Status::Message("Reloading skin...".into()),
            Status::Message("Loading skin for OrpoPro...".into()),
            Status::Hidden,
        ]
    );
}

#[tokio::test]
async fn fetch_and_finish_can_run_apart() {
    let pipeline = SkinPipeline::new(known_player("OrpoPro", "abc123"));
    let mut status = RecordingStatus::default();

    let fetched = pipeline.fetch_skin("OrpoPro", &mut status).await;
    let mut model = sample_model();
    let outcome = pipeline.finish(&mut model, fetched, &mut status);

    assert_eq!(outcome.stage, SkinStage::Done);
    assert_eq!(status.last(), Some(&Status::Hidden));
}

#[tokio::test]
async fn model_without_meshes_is_not_an_error() {
    let pipeline = SkinPipeline::new(known_player("OrpoPro", "abc123"));
    let mut model = SceneNode::group("Empty");

    let outcome = pipeline
        .apply_skin(&mut model, "OrpoPro", &mut RecordingStatus::default())
        .await;

    assert!(outcome.is_success());
    assert_eq!(outcome.meshes, 0);
}

#[tokio::test]
async fn custom_endpoints_are_used() {
    let endpoints = Endpoints {
        identity_base: "http://localhost:8080/users/".into(),
        profile_base: "http://localhost:8080/session/profile".into(),
    };
    let http = FakeHttp::new()
        .route("http://localhost:8080/users/Steve", 200, identity_json("0001", "Steve"))
        .route(
            "http://localhost:8080/session/profile/0001",
            200,
            profile_json("0001", "Steve", &[("textures", textures_value(Some(SKIN_URL)).as_str())]),
        )
        .route(SKIN_URL, 200, png(64, 32));
    let pipeline = SkinPipeline::new(http).with_endpoints(endpoints);

    let texture = pipeline
        .fetch_skin("Steve", &mut RecordingStatus::default())
        .await
        .expect("skin");

    assert_eq!(texture.dimensions(), (64, 32));
}

#[tokio::test]
async fn probe_reports_without_downloading() {
    let http = known_player("OrpoPro", "abc123");

    let report = probe_handle(&http, &Endpoints::default(), "OrpoPro").await;

    assert!(report.error.is_none(), "{:?}", report.error);
    assert_eq!(report.id.as_ref().map(|id| id.as_str()), Some("abc123"));
    assert_eq!(report.name.as_deref(), Some("OrpoPro"));
    assert_eq!(report.properties, vec!["textures".to_string()]);
    assert_eq!(report.skin_url.as_deref(), Some(SKIN_URL));
    assert!(!report.slim);
    assert!(!http.was_requested(SKIN_URL));
    assert!(report.to_string().contains("classic"));
}

#[tokio::test]
async fn probe_of_unknown_handle_carries_the_error() {
    let report = probe_handle(&FakeHttp::new(), &Endpoints::default(), "ghostuser").await;

    assert!(report.id.is_none());
    assert_eq!(
        report.error,
        Some(SkinError::IdentityNotFound("ghostuser".into()))
    );
    assert!(report.to_string().contains("Player \"ghostuser\" not found"));
}
