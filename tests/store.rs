mod common;

#[cfg(test)]
mod tests {
    use super::*;

    use common::*;
    use rucs::cache::{self, CacheClient, MemoryCache};
    use rucs::codec::{self, Codec, SecureCookie};
    use rucs::{CacheStore, Error, KeyPair};
    use std::sync::Arc;

    fn create_store(pairs: &[KeyPair]) -> CacheStore<MemoryCache> {
        CacheStore::new(Arc::new(MemoryCache::new()), "sess_", pairs).unwrap()
    }

    #[tokio::test]
    async fn test_end_to_end_scenario() {
        let store = create_store(&[signing_pair()]);

        // A request without a cookie gets a new, empty session.
        let request = empty_jar();
        let (mut session, err) = store.new_session(&request, "sid").await;
        assert!(err.is_none());
        assert!(session.is_new());
        assert!(session.values().is_empty());

        session.insert("user", "alice").unwrap();
        store.save(&request, &mut session).await.unwrap();

        // The cache holds the values under the prefixed id.
        let key = format!("sess_{}", session.id());
        assert_eq!(session.id().len(), 52);
        assert_eq!(store.client().keys(), vec![key.clone()]);
        let item = store.client().get(&key).await.unwrap();
        assert!(!item.value.is_empty());

        // The cookie carries the encoded id, not the values.
        let cookie = issued(&request, "sid").unwrap();
        assert_ne!(cookie.value(), session.id());
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(
            cookie.max_age(),
            Some(cookie::time::Duration::seconds(2_592_000))
        );

        // Replaying the cookie restores the session.
        let next = replay(&request, "sid");
        let (restored, err) = store.new_session(&next, "sid").await;
        assert!(err.is_none());
        assert!(!restored.is_new());
        assert_eq!(restored.get::<String>("user").unwrap().as_deref(), Some("alice"));
        assert_eq!(restored.values().len(), 1);
    }

    #[tokio::test]
    async fn test_round_trip_with_every_codec_kind() {
        for pairs in [
            vec![signing_pair()],
            vec![encrypting_pair()],
            vec![encrypting_pair(), signing_pair()],
        ] {
            let store = create_store(&pairs);
            let test_data = create_test_session();

            let request = empty_jar();
            let (mut session, _) = store.new_session(&request, "sid").await;
            session.insert("user", &test_data.user).unwrap();
            session.insert("preferences", &test_data.preferences).unwrap();
            session.insert("visits", &7u64).unwrap();
            store.save(&request, &mut session).await.unwrap();

            let next = replay(&request, "sid");
            let (restored, err) = store.new_session(&next, "sid").await;

            assert!(err.is_none());
            assert!(!restored.is_new());
            assert_eq!(restored.values(), session.values());
            assert_eq!(
                restored.get::<TestUser>("user").unwrap(),
                Some(test_data.user.clone())
            );
        }
    }

    #[tokio::test]
    async fn test_cookie_options_are_applied() {
        let mut store = create_store(&[signing_pair()]);
        store.set_options(build_cookie_options().domain("example.com"));

        let request = empty_jar();
        let (mut session, _) = store.new_session(&request, "sid").await;
        session.options = session.options.max_age(60);
        store.save(&request, &mut session).await.unwrap();

        let cookie = issued(&request, "sid").unwrap();
        assert_eq!(cookie.domain(), Some("example.com"));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(cookie::SameSite::Lax));
        assert_eq!(cookie.max_age(), Some(cookie::time::Duration::seconds(60)));

        // The store defaults are copied, not shared.
        assert_eq!(store.options().max_age, 15);
    }

    #[tokio::test]
    async fn test_tampered_cookie_is_rejected() {
        for pair in [signing_pair(), encrypting_pair()] {
            let store = create_store(&[pair]);

            let request = empty_jar();
            let (mut session, _) = store.new_session(&request, "sid").await;
            session.insert("user", "alice").unwrap();
            store.save(&request, &mut session).await.unwrap();
            let value = issued(&request, "sid").unwrap().value().to_owned();

            for index in 0..value.len() {
                let mut bytes = value.as_bytes().to_vec();
                bytes[index] = if bytes[index] == b'x' { b'y' } else { b'x' };
                let tampered = String::from_utf8(bytes).unwrap();

                let (session, err) = store.new_session(&jar_with("sid", &tampered), "sid").await;
                assert!(
                    matches!(err, Some(Error::Codec(_))),
                    "tampering at byte {index} was not detected"
                );
                assert!(session.is_new());
                assert!(session.id().is_empty());
                assert!(session.values().is_empty());
            }
        }
    }

    #[tokio::test]
    async fn test_cookie_for_another_name_is_rejected() {
        let store = create_store(&[encrypting_pair()]);

        let request = empty_jar();
        let (mut session, _) = store.new_session(&request, "sid").await;
        store.save(&request, &mut session).await.unwrap();
        let value = issued(&request, "sid").unwrap().value().to_owned();

        let (other, err) = store.new_session(&jar_with("other", &value), "other").await;
        assert!(err.is_some());
        assert!(other.is_new());
    }

    #[tokio::test]
    async fn test_key_rotation() {
        let old = KeyPair::new(b"old-hash-key".to_vec());
        let new = KeyPair::new(b"new-hash-key".to_vec());
        let cache = Arc::new(MemoryCache::new());

        let old_store = CacheStore::new(Arc::clone(&cache), "sess_", &[old.clone()]).unwrap();
        let rotated = CacheStore::new(Arc::clone(&cache), "sess_", &[new.clone(), old]).unwrap();
        let new_only = CacheStore::new(Arc::clone(&cache), "sess_", &[new]).unwrap();

        // Issued before the rotation: decoded by the old codec.
        let request = empty_jar();
        let (mut session, _) = old_store.new_session(&request, "sid").await;
        session.insert("user", "alice").unwrap();
        old_store.save(&request, &mut session).await.unwrap();

        let (restored, err) = rotated.new_session(&replay(&request, "sid"), "sid").await;
        assert!(err.is_none());
        assert!(!restored.is_new());
        assert_eq!(restored.get::<String>("user").unwrap().as_deref(), Some("alice"));

        // Issued after the rotation: encoded by the new codec only.
        let request = empty_jar();
        let (mut session, _) = rotated.new_session(&request, "sid").await;
        session.insert("user", "bob").unwrap();
        rotated.save(&request, &mut session).await.unwrap();

        let (restored, err) = new_only.new_session(&replay(&request, "sid"), "sid").await;
        assert!(err.is_none());
        assert_eq!(restored.get::<String>("user").unwrap().as_deref(), Some("bob"));

        let (_, err) = old_store.new_session(&replay(&request, "sid"), "sid").await;
        assert!(matches!(err, Some(Error::Codec(codec::Error::Multi(_)))));
    }

    #[tokio::test]
    async fn test_max_length_enforcement() {
        let mut store = create_store(&[signing_pair()]);
        let blob = "x".repeat(10_000);

        let request = empty_jar();
        let (mut session, _) = store.new_session(&request, "sid").await;
        session.insert("blob", &blob).unwrap();

        let err = store.save(&request, &mut session).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Codec(codec::Error::EncodedValueTooLong)
        ));
        assert!(issued(&request, "sid").is_none());
        assert!(store.client().is_empty());

        store.set_max_length(0);
        session.insert("blob", &"y".repeat(100_000)).unwrap();
        store.save(&request, &mut session).await.unwrap();

        let (restored, err) = store.new_session(&replay(&request, "sid"), "sid").await;
        assert!(err.is_none());
        assert_eq!(restored.get::<String>("blob").unwrap().map(|b| b.len()), Some(100_000));
    }

    #[tokio::test]
    async fn test_cache_limits_still_apply_without_max_length() {
        let cache = Arc::new(MemoryCache::new().with_max_item_size(1024));
        let mut store = CacheStore::new(cache, "sess_", &[signing_pair()]).unwrap();
        store.set_max_length(0);

        let request = empty_jar();
        let (mut session, _) = store.new_session(&request, "sid").await;
        session.insert("blob", &"z".repeat(4096)).unwrap();

        let err = store.save(&request, &mut session).await.unwrap_err();
        assert!(matches!(err, Error::Cache(cache::Error::TooLarge { .. })));
        assert!(issued(&request, "sid").is_none());
    }

    #[tokio::test]
    async fn test_expired_cache_entry() {
        let cache = Arc::new(MemoryCache::new().with_default_ttl(std::time::Duration::from_millis(100)));
        let store = CacheStore::new(cache, "sess_", &[signing_pair()]).unwrap();

        let request = empty_jar();
        let (mut session, _) = store.new_session(&request, "sid").await;
        session.insert("user", "alice").unwrap();
        store.save(&request, &mut session).await.unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(300)).await;

        let (restored, err) = store.new_session(&replay(&request, "sid"), "sid").await;
        assert!(matches!(err, Some(Error::Cache(cache::Error::Miss))));
        assert!(restored.is_new());
        assert_eq!(restored.id(), session.id());

        // Saving again reuses the id from the cookie.
        let mut restored = restored;
        restored.insert("user", "alice").unwrap();
        store.save(&request, &mut restored).await.unwrap();
        assert_eq!(restored.id(), session.id());
    }

    #[tokio::test]
    async fn test_builder() {
        #[derive(Debug)]
        struct Reversed;

        impl Codec for Reversed {
            fn encode(&self, _name: &str, value: &[u8]) -> Result<String, codec::Error> {
                let mut reversed = value.to_vec();
                reversed.reverse();
                Ok(data_encoding::HEXLOWER.encode(&reversed))
            }

            fn decode(&self, _name: &str, value: &str) -> Result<Vec<u8>, codec::Error> {
                let mut bytes = data_encoding::HEXLOWER
                    .decode(value.as_bytes())
                    .map_err(|err| codec::Error::Malformed(err.to_string()))?;
                bytes.reverse();
                Ok(bytes)
            }
        }

        let store = CacheStore::builder()
            .client(Arc::new(MemoryCache::new()))
            .key_prefix("app:")
            .codec(Reversed)
            .cookie_options(build_cookie_options())
            .max_length(0)
            .build()
            .unwrap();

        let request = empty_jar();
        let (mut session, _) = store.new_session(&request, "sid").await;
        session.insert("user", "alice").unwrap();
        store.save(&request, &mut session).await.unwrap();

        assert!(store.client().keys()[0].starts_with("app:"));

        let (restored, err) = store.new_session(&replay(&request, "sid"), "sid").await;
        assert!(err.is_none());
        assert_eq!(restored.get::<String>("user").unwrap().as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn test_builder_max_age_limits_codecs() {
        let store = CacheStore::builder()
            .client(Arc::new(MemoryCache::new()))
            .key_pair(signing_pair())
            .max_age(120)
            .build()
            .unwrap();
        assert_eq!(store.options().max_age, 120);

        let codec = SecureCookie::new(&signing_pair()).unwrap().max_age(120);
        let encoded = codec.encode("sid", b"id").unwrap();
        assert_eq!(codec.decode("sid", &encoded).unwrap(), b"id");
    }

    #[tokio::test]
    async fn test_destroy() {
        let store = create_store(&[signing_pair()]);

        let request = empty_jar();
        let (mut session, _) = store.new_session(&request, "sid").await;
        session.insert("user", "alice").unwrap();
        store.save(&request, &mut session).await.unwrap();
        let old_cookie = issued(&request, "sid").unwrap();

        let next = replay(&request, "sid");
        let (mut restored, _) = store.new_session(&next, "sid").await;
        store.destroy(&next, &mut restored).await.unwrap();

        assert!(store.client().is_empty());
        let removal = issued(&next, "sid").unwrap();
        assert_eq!(removal.max_age(), Some(cookie::time::Duration::ZERO));

        let (gone, err) = store
            .new_session(&jar_with("sid", old_cookie.value()), "sid")
            .await;
        assert!(matches!(err, Some(Error::Cache(cache::Error::Miss))));
        assert!(gone.values().is_empty());
    }
}
