use std::collections::HashMap;

use crate::effects::GammaLayer;
use crate::fade::Fade;
use crate::frame::{EffectParameters, Frame};
use crate::model::Model;
use crate::playlist::Playlist;
use crate::{LuminaireError, Result};

/// Seconds spent fading out toward the intermediate scene during a two-step
/// playlist swap.
const SWAP_FADE_OUT_SECS: f64 = 0.25;

/// Renders the selected scene of the currently active playlist, performing
/// smooth transitions whenever the selection changes (either by advancing
/// within the playlist or by swapping playlists), and applies gamma
/// correction after everything else.
#[derive(Debug)]
pub struct Renderer {
    playlists: HashMap<String, Playlist>,
    active: String,
    /// Target of an in-flight cross-playlist fade; committed as active when
    /// the fade completes.
    pending: Option<String>,
    fade: Option<Fade>,
    use_fast_fades: bool,
    gamma: GammaLayer,
}

impl Renderer {
    /// Creates a renderer over the given named playlists.
    ///
    /// `active` names the playlist displayed first; it may only be omitted
    /// when exactly one playlist is defined.
    pub fn new(
        playlists: HashMap<String, Playlist>,
        active: Option<&str>,
        use_fast_fades: bool,
        gamma: f32,
    ) -> Result<Self> {
        if playlists.is_empty() {
            return Err(LuminaireError::config(
                "a renderer requires at least one playlist",
            ));
        }
        let active = match active {
            Some(name) if playlists.contains_key(name) => name.to_string(),
            Some(name) => return Err(LuminaireError::UnknownPlaylist(name.to_string())),
            None if playlists.len() == 1 => playlists
                .keys()
                .next()
                .cloned()
                .ok_or_else(|| LuminaireError::config("a renderer requires at least one playlist"))?,
            None => {
                return Err(LuminaireError::config(
                    "an active playlist must be named when several are defined",
                ))
            }
        };
        Ok(Self {
            playlists,
            active,
            pending: None,
            fade: None,
            use_fast_fades,
            gamma: GammaLayer::new(gamma),
        })
    }

    /// Name of the playlist currently being displayed (or faded away from).
    pub fn active_playlist(&self) -> &str {
        &self.active
    }

    /// Name of the playlist an in-flight swap is heading toward, if any.
    pub fn pending_playlist(&self) -> Option<&str> {
        self.pending.as_deref()
    }

    pub fn is_fading(&self) -> bool {
        self.fade.is_some()
    }

    /// Produces one finished frame: drives the active fade (retiring it on
    /// completion and committing any pending playlist swap), or renders the
    /// active selection directly; then applies gamma correction exactly
    /// once.
    pub fn render(&mut self, model: &Model, params: &EffectParameters, frame: &mut Frame) {
        if let Some(fade) = self.fade.as_mut() {
            fade.render(model, params, frame);
            if fade.is_done() {
                if let Some(next) = self.pending.take() {
                    self.active = next;
                }
                self.fade = None;
            }
        } else if let Some(playlist) = self.playlists.get(&self.active) {
            playlist.selection().render_into(model, params, frame);
        }
        self.gamma.apply(frame);
    }

    /// Advances the selection within the active playlist, crossfading from
    /// the outgoing scene to the incoming one over `fade_time` seconds.
    pub fn advance_current_playlist(&mut self, fade_time: f64) -> Result<()> {
        let active = self.active.clone();
        let playlist = self.playlist_mut(&active)?;
        let outgoing = playlist.selection();
        playlist.advance();
        let incoming = playlist.selection();
        self.fade = Some(Fade::linear(Some(outgoing), Some(incoming), fade_time));
        Ok(())
    }

    /// Switches to another playlist, fading from the current selection to
    /// the target's.
    ///
    /// The transition is a fade through black when the renderer was built
    /// with fast fades, a two-step crossfade through `intermediate`'s
    /// current selection when one is named (dwelling on it for the longest
    /// transition time its layers recommend), or a direct crossfade
    /// otherwise. The target only becomes active once the fade completes.
    /// With `advance_after_fade_out`, the playlists being left are stepped
    /// immediately so a later return to them resumes past the scene just
    /// shown.
    pub fn swap_playlists(
        &mut self,
        target: &str,
        intermediate: Option<&str>,
        advance_after_fade_out: bool,
        fade_time: f64,
    ) -> Result<()> {
        let outgoing = self.playlist(&self.active)?.selection();
        let incoming = self.playlist(target)?.selection();

        let fade = if self.use_fast_fades {
            Fade::fast(outgoing, incoming, fade_time)
        } else if let Some(name) = intermediate {
            let middle = self.playlist_mut(name)?;
            let middle_scene = middle.selection();
            if advance_after_fade_out {
                middle.advance();
            }
            let dwell = middle_scene.transition_fade_time();
            Fade::two_step_linear(outgoing, middle_scene, incoming, SWAP_FADE_OUT_SECS, dwell)
        } else {
            Fade::linear(Some(outgoing), Some(incoming), fade_time)
        };

        self.fade = Some(fade);
        self.pending = Some(target.to_string());
        if advance_after_fade_out {
            let active = self.active.clone();
            self.playlist_mut(&active)?.advance();
        }
        Ok(())
    }

    fn playlist(&self, name: &str) -> Result<&Playlist> {
        self.playlists
            .get(name)
            .ok_or_else(|| LuminaireError::UnknownPlaylist(name.to_string()))
    }

    fn playlist_mut(&mut self, name: &str) -> Result<&mut Playlist> {
        self.playlists
            .get_mut(name)
            .ok_or_else(|| LuminaireError::UnknownPlaylist(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::SolidColorLayer;
    use crate::frame::Color;
    use crate::layer::EffectLayer;
    use crate::scene::{Scene, SharedScene};

    fn solid(color: Color) -> SharedScene {
        Scene::shared(vec![Box::new(SolidColorLayer::new(color))])
    }

    fn single_scene_playlist(color: Color) -> Playlist {
        Playlist::new(vec![solid(color)]).unwrap()
    }

    fn model() -> Model {
        Model::from_positions(vec![[0.0; 3]])
    }

    fn two_playlist_renderer(gamma: f32) -> Renderer {
        let mut playlists = HashMap::new();
        playlists.insert("on".to_string(), single_scene_playlist([1.0, 0.0, 0.0]));
        playlists.insert("off".to_string(), single_scene_playlist([0.0, 1.0, 0.0]));
        Renderer::new(playlists, Some("on"), false, gamma).unwrap()
    }

    fn render_at(renderer: &mut Renderer, model: &Model, time: f64) -> Frame {
        let mut frame = Frame::new(model.led_count());
        renderer.render(model, &EffectParameters::at(time), &mut frame);
        frame
    }

    #[test]
    fn requires_at_least_one_playlist() {
        let err = Renderer::new(HashMap::new(), None, false, 2.2).unwrap_err();
        assert!(matches!(err, LuminaireError::InvalidConfig(_)));
    }

    #[test]
    fn single_playlist_needs_no_active_name() {
        let mut playlists = HashMap::new();
        playlists.insert("only".to_string(), single_scene_playlist([1.0, 0.0, 0.0]));

        let renderer = Renderer::new(playlists, None, false, 2.2).unwrap();

        assert_eq!(renderer.active_playlist(), "only");
    }

    #[test]
    fn multiple_playlists_require_an_active_name() {
        let mut playlists = HashMap::new();
        playlists.insert("a".to_string(), single_scene_playlist([1.0, 0.0, 0.0]));
        playlists.insert("b".to_string(), single_scene_playlist([0.0, 1.0, 0.0]));

        assert!(Renderer::new(playlists, None, false, 2.2).is_err());
    }

    #[test]
    fn unknown_active_name_is_rejected() {
        let mut playlists = HashMap::new();
        playlists.insert("a".to_string(), single_scene_playlist([1.0, 0.0, 0.0]));

        let err = Renderer::new(playlists, Some("missing"), false, 2.2).unwrap_err();
        assert!(matches!(err, LuminaireError::UnknownPlaylist(_)));
    }

    #[test]
    fn renders_the_active_selection_through_gamma() {
        let mut renderer = two_playlist_renderer(2.0);
        let model = model();

        let frame = render_at(&mut renderer, &model, 0.0);

        // Solid red 1.0 through gamma 2.0 stays 1.0; other channels stay 0.
        assert_eq!(frame[0], [1.0, 0.0, 0.0]);
    }

    #[test]
    fn gamma_applies_while_fading_too() {
        let mut renderer = two_playlist_renderer(2.0);
        let model = model();
        renderer.swap_playlists("off", None, false, 2.0).unwrap();

        render_at(&mut renderer, &model, 0.0);
        let midway = render_at(&mut renderer, &model, 1.0);

        // Both channels blend to 0.5, then gamma squares them.
        assert!((midway[0][0] - 0.25).abs() < 1e-3);
        assert!((midway[0][1] - 0.25).abs() < 1e-3);
    }

    #[test]
    fn swap_commits_the_pending_playlist_when_the_fade_ends() {
        let mut renderer = two_playlist_renderer(1.0);
        let model = model();
        renderer.swap_playlists("off", None, true, 2.0).unwrap();

        assert_eq!(renderer.pending_playlist(), Some("off"));

        let mut time = 0.0;
        while time < 2.5 {
            render_at(&mut renderer, &model, time);
            time += 0.5;
        }

        assert_eq!(renderer.active_playlist(), "off");
        assert_eq!(renderer.pending_playlist(), None);
        assert!(!renderer.is_fading());

        let frame = render_at(&mut renderer, &model, 3.0);
        assert_eq!(frame[0], [0.0, 1.0, 0.0]);
    }

    #[test]
    fn swap_to_unknown_playlist_is_a_caller_error() {
        let mut renderer = two_playlist_renderer(2.2);

        let err = renderer.swap_playlists("nowhere", None, false, 1.0).unwrap_err();

        assert!(matches!(err, LuminaireError::UnknownPlaylist(_)));
        assert!(!renderer.is_fading());
        assert_eq!(renderer.pending_playlist(), None);
    }

    #[test]
    fn advance_crossfades_within_the_active_playlist() {
        let mut playlists = HashMap::new();
        playlists.insert(
            "main".to_string(),
            Playlist::new(vec![solid([1.0, 0.0, 0.0]), solid([0.0, 0.0, 1.0])]).unwrap(),
        );
        let mut renderer = Renderer::new(playlists, Some("main"), false, 1.0).unwrap();
        let model = model();

        renderer.advance_current_playlist(1.0).unwrap();
        assert!(renderer.is_fading());

        render_at(&mut renderer, &model, 0.0);
        let midway = render_at(&mut renderer, &model, 0.5);
        assert!((midway[0][0] - 0.5).abs() < 1e-6);
        assert!((midway[0][2] - 0.5).abs() < 1e-6);

        render_at(&mut renderer, &model, 1.0);
        assert!(!renderer.is_fading());
        let settled = render_at(&mut renderer, &model, 1.5);
        assert_eq!(settled[0], [0.0, 0.0, 1.0]);
    }

    #[test]
    fn swap_through_an_intermediate_dwells_on_it() {
        let mut playlists = HashMap::new();
        playlists.insert("on".to_string(), single_scene_playlist([1.0, 0.0, 0.0]));
        playlists.insert("off".to_string(), single_scene_playlist([0.0, 1.0, 0.0]));
        playlists.insert(
            "transition".to_string(),
            single_scene_playlist([1.0, 1.0, 1.0]),
        );
        let mut renderer = Renderer::new(playlists, Some("on"), false, 1.0).unwrap();
        let model = model();

        renderer
            .swap_playlists("off", Some("transition"), false, 1.0)
            .unwrap();

        render_at(&mut renderer, &model, 0.0);
        // Past the 0.25 s fade-out: the first leg finishes, leaving the
        // intermediate scene.
        render_at(&mut renderer, &model, 0.3);
        let dwell = render_at(&mut renderer, &model, 0.5);
        assert_eq!(dwell[0], [1.0, 1.0, 1.0]);

        // The default dwell is one second from the second leg's first call.
        render_at(&mut renderer, &model, 1.6);
        assert_eq!(renderer.active_playlist(), "off");
        assert!(!renderer.is_fading());
    }

    #[test]
    fn fast_fades_dip_through_black() {
        let mut playlists = HashMap::new();
        playlists.insert("on".to_string(), single_scene_playlist([1.0, 0.0, 0.0]));
        playlists.insert("off".to_string(), single_scene_playlist([0.0, 1.0, 0.0]));
        let mut renderer = Renderer::new(playlists, Some("on"), true, 1.0).unwrap();
        let model = model();

        renderer.swap_playlists("off", None, false, 2.0).unwrap();

        render_at(&mut renderer, &model, 0.0);
        // End of the fade-out leg: nothing but black.
        let dark = render_at(&mut renderer, &model, 0.99);
        assert!(dark[0][0] < 0.02);
        assert_eq!(dark[0][1], 0.0);

        // The fade-out leg completes, then the fade-in leg runs its own
        // one-second clock from its first render call.
        render_at(&mut renderer, &model, 1.0);
        render_at(&mut renderer, &model, 1.1);
        render_at(&mut renderer, &model, 2.2);
        assert_eq!(renderer.active_playlist(), "off");
    }

    #[test]
    fn advance_after_fade_out_steps_the_source_playlist() {
        let first = solid([1.0, 0.0, 0.0]);
        let second = solid([0.0, 0.0, 1.0]);
        let mut playlists = HashMap::new();
        playlists.insert(
            "main".to_string(),
            Playlist::new(vec![first, second.clone()]).unwrap(),
        );
        playlists.insert("other".to_string(), single_scene_playlist([0.0, 1.0, 0.0]));
        let mut renderer = Renderer::new(playlists, Some("main"), false, 1.0).unwrap();

        renderer.swap_playlists("other", None, true, 1.0).unwrap();

        // A later return to "main" resumes on its second scene.
        let resumed = renderer.playlist("main").unwrap().selection();
        assert!(std::rc::Rc::ptr_eq(&resumed, &second));
    }

    #[test]
    fn new_transition_replaces_the_one_in_flight() {
        let mut renderer = two_playlist_renderer(1.0);
        let model = model();

        renderer.swap_playlists("off", None, false, 10.0).unwrap();
        render_at(&mut renderer, &model, 0.0);

        // A second request discards the slow fade outright.
        renderer.swap_playlists("off", None, false, 0.5).unwrap();
        render_at(&mut renderer, &model, 1.0);
        render_at(&mut renderer, &model, 1.6);

        assert_eq!(renderer.active_playlist(), "off");
        assert!(!renderer.is_fading());
    }

    #[test]
    fn failing_layer_does_not_poison_the_frame() {
        struct Faulty;
        impl EffectLayer for Faulty {
            fn render(
                &mut self,
                _model: &Model,
                _params: &EffectParameters,
                _frame: &mut Frame,
            ) -> crate::Result<()> {
                Err(LuminaireError::msg("corrupt cached state"))
            }
        }

        let scene = Scene::shared(vec![
            Box::new(Faulty),
            Box::new(SolidColorLayer::new([0.0, 1.0, 0.0])),
        ]);
        let mut playlists = HashMap::new();
        playlists.insert("main".to_string(), Playlist::new(vec![scene]).unwrap());
        let mut renderer = Renderer::new(playlists, Some("main"), false, 1.0).unwrap();
        let model = model();

        let frame = render_at(&mut renderer, &model, 0.0);

        assert_eq!(frame[0], [0.0, 1.0, 0.0]);
    }
}
