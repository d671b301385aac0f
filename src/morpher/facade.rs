//! The morpher facade: latent state, load progress, and face generation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{
    Arc, Mutex, MutexGuard, OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard,
};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::loader::{load_parameters, LoadStatus};
use super::source::ParameterSource;
use crate::config::{validate_config, MorpherConfig};
use crate::decoder::{DecoderNetwork, PixelGrid};
use crate::latent::{IndexMapping, LatentVector};
use crate::params::ParameterStore;
use crate::{Error, Result};

/// Interactive face decoder
///
/// Owns the current latent vector and the decoder parameters. Parameters load
/// in the background; the latent vector is sampled at construction and can be
/// inspected and edited before loading completes.
///
/// All methods take `&self`, so a `Morpher` can be shared across tasks behind
/// an `Arc`. [`generate_face`](Self::generate_face) decodes a snapshot of the
/// latent vector, never a half-applied update.
///
/// # Example
///
/// ```no_run
/// use morpher::{FileSource, Morpher, MorpherConfig};
///
/// # async fn run() -> morpher::Result<()> {
/// let morpher = Morpher::load(FileSource::new("assets"), MorpherConfig::default()).await?;
/// morpher.set_coordinate(3, 0.8)?;
/// let face = morpher.generate_face()?;
/// assert_eq!(face.side(), 48);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Morpher {
    config: MorpherConfig,
    mapping: IndexMapping,
    latent: RwLock<LatentVector>,
    selection: Mutex<(usize, usize)>,
    frozen: AtomicBool,
    rng: Mutex<StdRng>,
    store: Arc<OnceLock<Arc<ParameterStore>>>,
    decoder: OnceLock<DecoderNetwork>,
    status: watch::Receiver<LoadStatus>,
}

impl Morpher {
    /// Start loading parameters from `source` and return immediately.
    ///
    /// Must be called from within a tokio runtime; the loader runs as a task on
    /// it. The initial latent vector is drawn from an OS-seeded generator.
    pub fn create<S: ParameterSource>(source: S, config: MorpherConfig) -> Result<Self> {
        Self::create_with_rng(source, config, StdRng::from_os_rng())
    }

    /// Like [`create`](Self::create), with a reproducible latent sequence.
    pub fn create_seeded<S: ParameterSource>(
        source: S,
        config: MorpherConfig,
        seed: u64,
    ) -> Result<Self> {
        Self::create_with_rng(source, config, StdRng::seed_from_u64(seed))
    }

    /// Like [`create`](Self::create), drawing every latent sample from `rng`.
    pub fn create_with_rng<S: ParameterSource>(
        source: S,
        config: MorpherConfig,
        mut rng: StdRng,
    ) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|e| Error::Config {
            message: format!("Morpher::create needs a tokio runtime: {e}"),
        })?;

        validate_config(&config)?;
        let mapping = IndexMapping::new(config.index_mapping.clone(), config.latent_dim)?;
        let (d0, d1) = config.default_dimensions;

        let latent = LatentVector::sample(&mut rng, config.latent_dim, config.sampling)?;

        let store = Arc::new(OnceLock::new());
        let (tx, status) = watch::channel(LoadStatus::Pending);
        let loader = load_parameters(Arc::new(source), config.clone(), Arc::clone(&store));
        runtime.spawn(async move {
            let outcome = match loader.await {
                Ok(()) => {
                    info!("decoder parameters ready");
                    LoadStatus::Ready
                }
                Err(e) => {
                    warn!(error = %e, code = e.code(), "decoder parameters failed to load");
                    LoadStatus::Failed(e)
                }
            };
            tx.send_replace(outcome);
        });

        Ok(Self {
            config,
            mapping,
            latent: RwLock::new(latent),
            selection: Mutex::new((d0, d1)),
            frozen: AtomicBool::new(false),
            rng: Mutex::new(rng),
            store,
            decoder: OnceLock::new(),
            status,
        })
    }

    /// Create a morpher and wait until its parameters have loaded.
    pub async fn load<S: ParameterSource>(source: S, config: MorpherConfig) -> Result<Self> {
        let morpher = Self::create(source, config)?;
        morpher.wait_until_ready().await?;
        Ok(morpher)
    }

    // -- readiness --------------------------------------------------------

    /// Whether every parameter blob has loaded. Once true, stays true.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.store.get().is_some_and(|store| store.is_ready())
    }

    /// Blobs loaded so far
    #[must_use]
    pub fn loaded_count(&self) -> usize {
        self.store.get().map_or(0, |store| store.loaded_count())
    }

    /// Blobs required before generation; `None` until the manifest is parsed
    #[must_use]
    pub fn expected_count(&self) -> Option<usize> {
        self.store.get().map(|store| store.expected_count())
    }

    /// Current state of the background loader
    #[must_use]
    pub fn load_status(&self) -> LoadStatus {
        LoadStatus::clone(&self.status.borrow())
    }

    /// Resolve once loading has finished, with the first load error if any.
    pub async fn wait_until_ready(&self) -> Result<()> {
        let mut status = self.status.clone();
        let settled = {
            let current = status
                .wait_for(LoadStatus::is_settled)
                .await
                .map_err(|_| Error::load("decoder parameters", "loader stopped before finishing"))?;
            LoadStatus::clone(&current)
        };
        match settled {
            LoadStatus::Failed(e) => Err(e),
            LoadStatus::Ready | LoadStatus::Pending => Ok(()),
        }
    }

    // -- latent state -----------------------------------------------------

    /// Copy of the current latent vector
    #[must_use]
    pub fn get_latent(&self) -> LatentVector {
        self.read_latent().clone()
    }

    /// Replace the latent vector with a copy of `latent`.
    pub fn set_latent(&self, latent: impl Into<LatentVector>) -> Result<()> {
        let latent = latent.into();
        let expected = self.config.latent_dim;
        if latent.dim() != expected {
            return Err(Error::LatentLength { expected, actual: latent.dim() });
        }
        self.write_latent().replace(latent);
        debug!("latent vector replaced");
        Ok(())
    }

    /// Resample the whole latent vector from the configured prior.
    pub fn shuffle(&self) -> Result<()> {
        let fresh = {
            let mut rng = self.lock_rng();
            LatentVector::sample(&mut *rng, self.config.latent_dim, self.config.sampling)?
        };
        self.write_latent().replace(fresh);
        debug!("latent vector resampled");
        Ok(())
    }

    /// Set the coordinate of semantic dimension `semantic` to `value`.
    ///
    /// Invalid dimensions are rejected even while frozen; a valid write is
    /// dropped while frozen.
    pub fn set_coordinate(&self, semantic: usize, value: f32) -> Result<()> {
        let raw = self.mapping.resolve(semantic)?;
        if self.is_frozen() {
            debug!(semantic, "coordinates frozen, write ignored");
            return Ok(());
        }
        self.write_latent().set_coordinate(&self.mapping, semantic, value)?;
        debug!(semantic, raw, value, "latent coordinate set");
        Ok(())
    }

    /// Choose the two semantic dimensions driven by [`set_coordinates`](Self::set_coordinates).
    pub fn select_dimensions(&self, d0: usize, d1: usize) -> Result<()> {
        self.mapping.resolve(d0)?;
        self.mapping.resolve(d1)?;
        *self.lock_selection() = (d0, d1);
        debug!(d0, d1, "dimensions selected");
        Ok(())
    }

    /// The semantic dimensions driven by [`set_coordinates`](Self::set_coordinates)
    #[must_use]
    pub fn selected_dimensions(&self) -> (usize, usize) {
        *self.lock_selection()
    }

    /// Write `x` and `y` to the two selected dimensions in one update.
    pub fn set_coordinates(&self, x: f32, y: f32) -> Result<()> {
        let (d0, d1) = self.selected_dimensions();
        if self.is_frozen() {
            debug!(d0, d1, "coordinates frozen, write ignored");
            return Ok(());
        }
        let mut latent = self.write_latent();
        latent.set_coordinate(&self.mapping, d0, x)?;
        latent.set_coordinate(&self.mapping, d1, y)?;
        debug!(d0, d1, x, y, "latent coordinates set");
        Ok(())
    }

    /// Flip the freeze gate and return the new state.
    pub fn toggle_freeze(&self) -> Result<bool> {
        if !self.config.freeze_enabled {
            return Err(Error::FreezeDisabled);
        }
        let frozen = !self.frozen.fetch_xor(true, Ordering::AcqRel);
        debug!(frozen, "freeze toggled");
        Ok(frozen)
    }

    /// Whether coordinate writes are currently ignored
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::Acquire)
    }

    /// Move one uniformly chosen semantic dimension by `±walk_step`.
    ///
    /// Returns the dimension moved. Not affected by the freeze gate.
    pub fn random_walk_step(&self) -> Result<usize> {
        let (semantic, delta) = {
            let mut rng = self.lock_rng();
            let semantic = rng.random_range(0..self.mapping.len());
            let sign = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
            (semantic, sign * self.config.walk_step)
        };
        self.write_latent().offset_coordinate(&self.mapping, semantic, delta)?;
        debug!(semantic, delta, "random walk step");
        Ok(semantic)
    }

    // -- generation -------------------------------------------------------

    /// Decode the current latent vector into an image.
    ///
    /// Fails with [`NotReady`](Error::NotReady) until every blob has loaded.
    pub fn generate_face(&self) -> Result<PixelGrid> {
        let decoder = self.decoder()?;
        let latent = self.get_latent();
        let grid = decoder.forward(&latent)?;
        debug!(side = grid.side(), "face generated");
        Ok(grid)
    }

    fn decoder(&self) -> Result<&DecoderNetwork> {
        if let Some(decoder) = self.decoder.get() {
            return Ok(decoder);
        }
        let store = self.store.get().ok_or(Error::NotReady { loaded: 0, expected: 0 })?;
        let built = store.decoder(self.config.image_side)?;
        let decoder = self.decoder.get_or_init(|| built);
        Ok(decoder)
    }

    /// The semantic dimension table
    #[must_use]
    pub fn mapping(&self) -> &IndexMapping {
        &self.mapping
    }

    /// The configuration this morpher was created with
    #[must_use]
    pub fn config(&self) -> &MorpherConfig {
        &self.config
    }

    fn read_latent(&self) -> RwLockReadGuard<'_, LatentVector> {
        self.latent.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_latent(&self) -> RwLockWriteGuard<'_, LatentVector> {
        self.latent.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_rng(&self) -> MutexGuard<'_, StdRng> {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_selection(&self) -> MutexGuard<'_, (usize, usize)> {
        self.selection.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
