//! A server-side view of the crate: borrow a context, encode a packet into
//! it, move the bytes over a (mock) socket, and hand the context back.

use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_test::io::Builder;
use wirepool::protocols::mqtt::{remaining_length, string};
use wirepool::runtime::{AsyncContextPool, Completion, OpType};
use wirepool::{ConnectPacket, PacketError, PoolConfig, QoS};

const CONNECT_ABC: [u8; 17] = [
    0x10, 0x0F, 0x00, 0x04, 0x4D, 0x51, 0x54, 0x54, 0x04, 0x02, 0x00, 0x1E, 0x00, 0x03, 0x61, 0x62,
    0x63,
];

fn pool(batch_size: usize, max_free_count: usize) -> AsyncContextPool {
    AsyncContextPool::from_config(&PoolConfig {
        batch_size,
        max_free_count,
        buffer_size: 256,
    })
    .unwrap()
}

#[tokio::test]
async fn test_send_connect_through_pooled_context() {
    let pool = pool(1, 1);
    let mut stream = Builder::new().write(&CONNECT_ABC).build();

    let mut ctx = pool.acquire();
    ConnectPacket::with_client_id("abc")
        .encode_into(ctx.buffer_mut())
        .unwrap();

    ctx.start(OpType::Send);
    let result = stream.write(ctx.pending_bytes()).await;
    ctx.complete(result);

    assert_eq!(ctx.completion(), Completion::Completed { bytes: 17 });
    assert!(ctx.pending_bytes().is_empty());

    assert!(pool.release(ctx).unwrap());
    assert_eq!(pool.stats().created, 1);

    // The recycled context comes back clean.
    let ctx = pool.acquire();
    assert!(ctx.buffer().is_empty());
    assert_eq!(ctx.completion(), Completion::Idle);
}

#[tokio::test]
async fn test_receive_connect_header() {
    let pool = pool(1, 1);
    let mut stream = Builder::new().read(&CONNECT_ABC).build();

    let mut ctx = pool.acquire();
    ctx.start(OpType::Receive);
    let result = stream.read_buf(ctx.buffer_mut()).await;
    ctx.complete(result);

    assert_eq!(ctx.bytes_transferred(), CONNECT_ABC.len());

    let data = ctx.buffer();
    assert_eq!(data[0] >> 4, 1);
    let (remaining, len_bytes) = remaining_length::decode(&data[1..]).unwrap();
    assert_eq!(remaining, data.len() - 1 - len_bytes);

    let (protocol_name, _) = string::decode_string(&data[1 + len_bytes..]).unwrap();
    assert_eq!(protocol_name, "MQTT");

    assert!(pool.release(ctx).unwrap());
}

#[tokio::test]
async fn test_failed_encode_leaves_context_empty() {
    let pool = pool(1, 1);

    let mut ctx = pool.acquire();
    let mut packet = ConnectPacket::with_client_id("abc");
    packet.protocol_version = "5.0".to_string();

    let err = packet.encode_into(ctx.buffer_mut()).unwrap_err();
    assert!(matches!(err, PacketError::UnsupportedVersion { .. }));
    assert!(ctx.buffer().is_empty());

    let err = ConnectPacket::new()
        .encode_into(ctx.buffer_mut())
        .unwrap_err();
    assert!(matches!(err, PacketError::InvalidClientIdentifier(_)));
    assert!(ctx.buffer().is_empty());

    assert!(pool.release(ctx).unwrap());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_connections_share_pool() {
    const CONNECTIONS: usize = 32;
    const MAX_FREE: usize = 4;

    let pool = Arc::new(pool(2, MAX_FREE));

    let tasks: Vec<_> = (0..CONNECTIONS)
        .map(|i| {
            let pool = Arc::clone(&pool);
            tokio::spawn(async move {
                let packet = ConnectPacket::with_client_id(format!("client-{i}"))
                    .with_clean_session(false)
                    .with_will("clients/status", "gone", QoS::AtLeastOnce, false);
                let expected = packet.encode().unwrap();
                let mut stream = Builder::new().write(&expected).build();

                let mut ctx = pool.acquire();
                packet.encode_into(ctx.buffer_mut()).unwrap();
                ctx.start(OpType::Send);
                let result = stream
                    .write_all(ctx.pending_bytes())
                    .await
                    .map(|_| expected.len());
                ctx.complete(result);
                assert_eq!(ctx.bytes_transferred(), expected.len());

                pool.release(ctx).unwrap();
                assert!(pool.free_count() <= MAX_FREE);
            })
        })
        .collect();

    for task in tasks {
        task.await.unwrap();
    }

    let stats = pool.stats();
    assert!(stats.free <= MAX_FREE);
    assert_eq!(stats.created, stats.free as u64 + stats.disposed);
    assert_eq!(stats.reused + stats.created - 2, CONNECTIONS as u64);
}
