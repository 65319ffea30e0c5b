use ohttp_envelope::{KeyConfig, MediaType, OhttpError, PrivateKey, Recipient, Sender};
use proptest::prelude::*;

const KDF_IDS: [u16; 3] = [0x0001, 0x0002, 0x0003];
const AEAD_IDS: [u16; 3] = [0x0001, 0x0002, 0x0003];

fn setup(kdf_id: u16, aead_id: u16) -> (Sender, Recipient) {
    let sk = PrivateKey::generate();
    let config = KeyConfig::builder()
        .key_id(7)
        .kem_id(0x0020)
        .kdf_id(kdf_id)
        .aead_id(aead_id)
        .public_key(sk.public_key().as_bytes())
        .build()
        .unwrap();
    (Sender::new(config).unwrap(), Recipient::new(sk))
}

#[test]
fn roundtrip_every_supported_suite() {
    for kdf_id in KDF_IDS {
        for aead_id in AEAD_IDS {
            let (sender, recipient) = setup(kdf_id, aead_id);
            for media_type in [MediaType::Bhttp, MediaType::Auction] {
                let (request, ctx) = sender.create_request(b"auction bid", media_type).unwrap();
                let (pt, response_ctx) = recipient.decrypt(request.as_bytes(), media_type).unwrap();
                assert_eq!(pt, b"auction bid");

                let response = response_ctx.encrypt(b"auction result").unwrap();
                assert_eq!(
                    sender.decrypt_response(&response, ctx).unwrap(),
                    b"auction result",
                    "kdf {:#06x} aead {:#06x}",
                    kdf_id,
                    aead_id
                );
            }
        }
    }
}

#[test]
fn roundtrip_empty_plaintext() {
    let (sender, recipient) = setup(0x0001, 0x0002);
    let (request, ctx) = sender.create_request(b"", MediaType::Bhttp).unwrap();
    let (pt, response_ctx) = recipient.decrypt(request.as_bytes(), MediaType::Bhttp).unwrap();
    assert!(pt.is_empty());

    let response = response_ctx.encrypt(b"").unwrap();
    assert!(ctx.decrypt_response(&response).unwrap().is_empty());
}

#[test]
fn roundtrip_large_plaintext() {
    let (sender, recipient) = setup(0x0001, 0x0001);
    let plaintext = vec![0xABu8; 65536];
    let (request, ctx) = sender.create_request(&plaintext, MediaType::Auction).unwrap();
    let (pt, response_ctx) = recipient.decrypt(request.as_bytes(), MediaType::Auction).unwrap();
    assert_eq!(pt, plaintext);

    let response = response_ctx.encrypt(&plaintext).unwrap();
    assert_eq!(ctx.decrypt_response(&response).unwrap(), plaintext);
}

#[test]
fn request_layout_is_header_enc_ciphertext() {
    let (sender, _) = setup(0x0001, 0x0002);
    let (request, ctx) = sender.create_request(b"data", MediaType::Bhttp).unwrap();
    let bytes = request.as_bytes();
    assert_eq!(&bytes[..7], &[0x07, 0x00, 0x20, 0x00, 0x01, 0x00, 0x02]);
    assert_eq!(&bytes[7..39], ctx.encapsulated_key());
    assert_eq!(bytes.len(), 7 + 32 + 4 + 16);
}

#[test]
fn fresh_ephemeral_key_per_request() {
    let (sender, _) = setup(0x0001, 0x0002);
    let (a, _) = sender.create_request(b"same", MediaType::Bhttp).unwrap();
    let (b, _) = sender.create_request(b"same", MediaType::Bhttp).unwrap();
    assert_ne!(a.encapsulated_key(), b.encapsulated_key());
    assert_ne!(a.ciphertext(), b.ciphertext());
}

#[test]
fn media_type_mismatch_fails_authentication() {
    let (sender, recipient) = setup(0x0001, 0x0002);
    let (request, _) = sender.create_request(b"data", MediaType::Auction).unwrap();
    assert_eq!(
        recipient.decrypt(request.as_bytes(), MediaType::Bhttp).err(),
        Some(OhttpError::Authentication)
    );
}

#[test]
fn response_for_other_request_fails() {
    let (sender, recipient) = setup(0x0001, 0x0002);
    let (_, ctx_a) = sender.create_request(b"a", MediaType::Bhttp).unwrap();
    let (req_b, _) = sender.create_request(b"b", MediaType::Bhttp).unwrap();

    let response_b = recipient
        .encrypt_response(req_b.as_bytes(), MediaType::Bhttp, b"for b")
        .unwrap();
    assert_eq!(ctx_a.decrypt_response(&response_b), Err(OhttpError::Authentication));
}

#[test]
fn config_parsed_from_wire_is_reusable_across_threads() {
    let sk = PrivateKey::generate();
    let mut blob = vec![0x2a, 0x00, 0x20];
    blob.extend_from_slice(sk.public_key().as_bytes());
    blob.extend_from_slice(&[0x00, 0x04, 0x00, 0x01, 0x00, 0x02]);

    let sender = std::sync::Arc::new(Sender::new(KeyConfig::parse(&blob).unwrap()).unwrap());
    let recipient = std::sync::Arc::new(Recipient::new(sk));

    let handles: Vec<_> = (0..4u8)
        .map(|i| {
            let sender = sender.clone();
            let recipient = recipient.clone();
            std::thread::spawn(move || {
                let msg = vec![i; 100];
                let (request, ctx) = sender.create_request(&msg, MediaType::Auction).unwrap();
                let (pt, rctx) = recipient.decrypt(request.as_bytes(), MediaType::Auction).unwrap();
                assert_eq!(pt, msg);
                let response = rctx.encrypt(&msg).unwrap();
                assert_eq!(ctx.decrypt_response(&response).unwrap(), msg);
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_request_and_response_roundtrip(
        request_pt in proptest::collection::vec(any::<u8>(), 0..512),
        response_pt in proptest::collection::vec(any::<u8>(), 0..512),
        auction in any::<bool>(),
    ) {
        let (sender, recipient) = setup(0x0001, 0x0002);
        let media_type = MediaType::from_changed(auction);

        let (request, ctx) = sender.create_request(&request_pt, media_type).unwrap();
        let (pt, response_ctx) = recipient.decrypt(request.as_bytes(), media_type).unwrap();
        prop_assert_eq!(&pt, &request_pt);

        let response = response_ctx.encrypt(&response_pt).unwrap();
        prop_assert_eq!(ctx.decrypt_response(&response).unwrap(), response_pt);
    }
}
