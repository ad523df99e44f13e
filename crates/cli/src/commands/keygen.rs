// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use graffiti_kernel::identity::Identity;

pub fn run() -> anyhow::Result<Identity> {
    let identity = Identity::from_bytes(&rand::random::<[u8; 32]>());

    println!("Address: {}", identity.address());
    println!("Secret:  {}", identity.secret_hex());
    println!("\nKeep the secret private. Pass it with --key to sign as this address.");

    Ok(identity)
}
