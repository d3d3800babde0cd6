#[cfg(test)]
pub mod test {
    use std::collections::HashMap;
    use std::net::{IpAddr, Ipv4Addr};
    use std::time::Duration;

    use ipnet::IpNet;
    use serde::Deserialize;

    use crate::error::CopreError;
    use crate::record::{Field, Record, Visitor};
    use crate::value::Ipv4Mask;

    /// In-memory environment for loaders under test.
    pub fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    /// Four string fields, one per source in the layering scenarios.
    #[derive(Deserialize, Debug, Default, Clone, PartialEq)]
    #[serde(default)]
    pub struct AllSources {
        pub a: String,
        pub b: String,
        pub c: String,
        pub d: String,
    }

    impl Record for AllSources {
        fn visit(&mut self, v: &mut dyn Visitor) -> Result<(), CopreError> {
            v.leaf(&Field::new("A").tags(&[("flag", "a")]), &mut self.a)?;
            v.leaf(&Field::new("B").tags(&[("flag", "b")]), &mut self.b)?;
            v.leaf(&Field::new("C").tags(&[("flag", "c")]), &mut self.c)?;
            v.leaf(&Field::new("D").tags(&[("flag", "d")]), &mut self.d)
        }
    }

    #[derive(Deserialize, Debug, Default, Clone, PartialEq)]
    #[serde(default)]
    pub struct Server {
        pub host: String,
        pub port: u16,
        pub database: Database,
        pub tls: Option<Tls>,
        pub tags: Vec<String>,
        pub secret: Vec<u8>,
        /// Runtime counter, never configured.
        #[serde(skip)]
        pub hits: u64,
    }

    impl Record for Server {
        fn visit(&mut self, v: &mut dyn Visitor) -> Result<(), CopreError> {
            const HOST: Field = Field::new("Host").tags(&[("flag", "host")]);
            const PORT: Field = Field::new("Port").tags(&[("flag", "port")]);
            const SECRET: Field = Field::new("Secret").tags(&[("env", ",hex")]);

            v.leaf(&HOST, &mut self.host)?;
            v.leaf(&PORT, &mut self.port)?;
            v.record(&Field::new("Database"), &mut self.database)?;
            v.optional(&Field::new("Tls"), &mut self.tls)?;
            v.leaf(&Field::new("Tags"), &mut self.tags)?;
            v.leaf(&SECRET, &mut self.secret)?;
            v.leaf(&Field::new("Hits").internal(), &mut self.hits)
        }
    }

    #[derive(Deserialize, Debug, Default, Clone, PartialEq)]
    #[serde(default)]
    pub struct Database {
        pub url: String,
        pub pool_size: u32,
        pub timeout: Duration,
    }

    impl Record for Database {
        fn visit(&mut self, v: &mut dyn Visitor) -> Result<(), CopreError> {
            v.leaf(
                &Field::new("Url").tags(&[("env", "DATABASE_URL,noprefix")]),
                &mut self.url,
            )?;
            v.leaf(&Field::new("PoolSize"), &mut self.pool_size)?;
            v.leaf(&Field::new("Timeout"), &mut self.timeout)
        }
    }

    #[derive(Deserialize, Debug, Default, Clone, PartialEq)]
    #[serde(default)]
    pub struct Tls {
        pub cert: String,
        pub key: String,
    }

    impl Record for Tls {
        fn visit(&mut self, v: &mut dyn Visitor) -> Result<(), CopreError> {
            v.leaf(&Field::new("Cert"), &mut self.cert)?;
            v.leaf(&Field::new("Key"), &mut self.key)
        }
    }

    /// Network settings with non-default compiled-in values.
    #[derive(Debug, Clone, PartialEq)]
    pub struct Listener {
        pub bind: IpAddr,
        pub allow: IpNet,
        pub mask: Ipv4Mask,
    }

    impl Default for Listener {
        fn default() -> Self {
            Self {
                bind: IpAddr::V4(Ipv4Addr::LOCALHOST),
                allow: "10.0.0.0/8".parse().unwrap(),
                mask: Ipv4Mask::from_prefix_len(8).unwrap(),
            }
        }
    }

    impl Record for Listener {
        fn visit(&mut self, v: &mut dyn Visitor) -> Result<(), CopreError> {
            v.leaf(&Field::new("Bind").tags(&[("flag", "bind")]), &mut self.bind)?;
            v.leaf(&Field::new("Allow").tags(&[("flag", "allow")]), &mut self.allow)?;
            v.leaf(&Field::new("Mask").tags(&[("flag", "mask")]), &mut self.mask)
        }
    }

    #[test]
    fn server_defaults_are_zero() {
        let server = Server::default();
        assert_eq!(server.host, "");
        assert_eq!(server.port, 0);
        assert!(server.tls.is_none());
        assert!(server.database.timeout.is_zero());
    }
}
