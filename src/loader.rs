//! The loader abstraction and the orchestrating [`load`] function.

use tracing::debug;

use crate::error::CopreError;
use crate::merge::merge;
use crate::record::{self, Record};

/// One configuration source. Populates a fresh snapshot of `R` with the
/// fields it can resolve and leaves the rest at their zero values.
pub trait Loader<R> {
    fn load(&self, dst: &mut R) -> Result<(), CopreError>;

    /// Short label used in log output.
    fn name(&self) -> &str {
        "custom"
    }
}

impl<R, F> Loader<R> for F
where
    F: Fn(&mut R) -> Result<(), CopreError>,
{
    fn load(&self, dst: &mut R) -> Result<(), CopreError> {
        self(dst)
    }
}

/// Populate `dst` from `loaders`, lowest precedence first.
///
/// Each loader fills a fresh `R::default()` snapshot which is merged into
/// `dst` before the next loader runs, so later loaders override earlier ones
/// field by field. Whatever `dst` held on entry acts as the lowest layer.
///
/// The first error aborts the whole load. Fields merged before the failure
/// stay in `dst`.
pub fn load<R: Record + Default>(
    dst: &mut R,
    loaders: &[&dyn Loader<R>],
) -> Result<(), CopreError> {
    record::validate(dst)?;
    for (position, loader) in loaders.iter().enumerate() {
        debug!(loader = loader.name(), position, "running loader");
        let mut snapshot = R::default();
        loader.load(&mut snapshot)?;
        merge(dst, snapshot)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::Server;

    fn port(port: u16) -> impl Fn(&mut Server) -> Result<(), CopreError> {
        move |s: &mut Server| {
            s.port = port;
            Ok(())
        }
    }

    fn host(host: &'static str) -> impl Fn(&mut Server) -> Result<(), CopreError> {
        move |s: &mut Server| {
            s.host = host.into();
            Ok(())
        }
    }

    #[test]
    fn later_loaders_win() {
        let mut server = Server::default();
        load(&mut server, &[&port(1), &port(2), &port(3)]).unwrap();
        assert_eq!(server.port, 3);
    }

    #[test]
    fn fields_unset_by_later_loaders_keep_earlier_values() {
        let mut server = Server::default();
        load(&mut server, &[&host("a"), &port(2)]).unwrap();
        assert_eq!(server.host, "a");
        assert_eq!(server.port, 2);
    }

    #[test]
    fn prepopulated_values_are_the_lowest_layer() {
        let mut server = Server {
            host: "default".into(),
            port: 80,
            ..Server::default()
        };
        load(&mut server, &[&port(8080)]).unwrap();
        assert_eq!(server.host, "default");
        assert_eq!(server.port, 8080);
    }

    #[test]
    fn loaders_receive_fresh_snapshots() {
        let mut server = Server {
            port: 80,
            ..Server::default()
        };
        let check = |s: &mut Server| -> Result<(), CopreError> {
            assert_eq!(s.port, 0, "snapshot must start zeroed");
            Ok(())
        };
        load(&mut server, &[&check, &port(1), &check]).unwrap();
    }

    #[test]
    fn error_aborts_remaining_loaders() {
        let mut server = Server::default();
        let fail = |_: &mut Server| -> Result<(), CopreError> {
            Err(CopreError::Loader("source offline".into()))
        };
        let err = load(&mut server, &[&port(1), &fail, &host("never")]).unwrap_err();
        assert!(err.to_string().contains("source offline"));
        assert_eq!(server.port, 1, "earlier layers stay merged");
        assert_eq!(server.host, "");
    }

    #[test]
    fn no_loaders_is_a_no_op() {
        let mut server = Server {
            port: 80,
            ..Server::default()
        };
        load(&mut server, &[]).unwrap();
        assert_eq!(server.port, 80);
    }

    #[derive(Default)]
    struct Broken {
        a: u8,
    }

    impl Record for Broken {
        fn visit(&mut self, v: &mut dyn crate::record::Visitor) -> Result<(), CopreError> {
            v.leaf(&crate::record::Field::new(""), &mut self.a)
        }
    }

    #[test]
    fn invalid_destination_runs_no_loader() {
        let mut broken = Broken::default();
        let set = |b: &mut Broken| -> Result<(), CopreError> {
            b.a = 1;
            Ok(())
        };
        let err = load(&mut broken, &[&set]).unwrap_err();
        assert!(matches!(err, CopreError::InvalidDestination { .. }));
        assert_eq!(broken.a, 0);
    }
}
