// src/services/password.rs
//
// Formato armazenado: "<custo>$<digest>.<salt-hex>" (o salt é sempre o último segmento)
// O digest é a parte final da saída do bcrypt (31 caracteres) calculada com
// um salt aleatório de 16 bytes, que fica guardado em hexadecimal.

use rand::RngCore;
use subtle::ConstantTimeEq;

use crate::common::error::AppError;

const SALT_LEN: usize = 16;
const DIGEST_LEN: usize = 31;

/// O bcrypt lê 72 bytes incluindo o NUL final; acima disso a senha seria truncada.
pub const MAX_PASSWORD_BYTES: usize = 71;

fn derive(password: &str, cost: u32, salt: [u8; SALT_LEN]) -> Result<String, AppError> {
    let full = match bcrypt::non_truncating_hash_with_salt(password, cost, salt) {
        Ok(parts) => parts.to_string(),
        Err(bcrypt::BcryptError::Truncation(_)) => {
            return Err(AppError::BadRequest(format!(
                "Password must be at most {MAX_PASSWORD_BYTES} bytes"
            )));
        }
        Err(e) => return Err(e.into()),
    };
    Ok(full[full.len() - DIGEST_LEN..].to_string())
}

pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);

    let digest = derive(password, cost, salt)?;
    Ok(format!("{cost}${digest}.{}", hex::encode(salt)))
}

/// Um valor armazenado malformado nunca confere.
pub fn verify_password(password: &str, stored: &str) -> Result<bool, AppError> {
    // O digest usa o base64 do bcrypt, que inclui '.'; o salt em hex não.
    let Some((head, salt_hex)) = stored.rsplit_once('.') else {
        return Ok(false);
    };
    let Some((cost, expected)) = head.split_once('$') else {
        return Ok(false);
    };
    let salt = hex::decode(salt_hex)
        .ok()
        .and_then(|bytes| <[u8; SALT_LEN]>::try_from(bytes).ok());
    let (Ok(cost), Some(salt)) = (cost.parse::<u32>(), salt) else {
        return Ok(false);
    };
    if !(4..=31).contains(&cost) || expected.len() != DIGEST_LEN {
        return Ok(false);
    }
    // Nada acima do limite chegou a ser gravado
    if password.len() > MAX_PASSWORD_BYTES {
        return Ok(false);
    }

    let digest = derive(password, cost, salt)?;
    Ok(digest.as_bytes().ct_eq(expected.as_bytes()).into())
}

// Versões assíncronas: o KDF é lento de propósito, então roda fora do executor.

pub async fn hash_password_blocking(password: String, cost: u32) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || hash_password(&password, cost))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))?
}

pub async fn verify_password_blocking(password: String, stored: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &stored))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))?
}

#[cfg(test)]
mod tests {
    use super::*;

    const COST: u32 = 4;

    #[test]
    fn hash_verifies_only_the_original_password() {
        let stored = hash_password("s3cret!", COST).unwrap();

        assert!(verify_password("s3cret!", &stored).unwrap());
        assert!(!verify_password("s3cret?", &stored).unwrap());
        assert!(!verify_password("", &stored).unwrap());
    }

    #[test]
    fn same_password_gets_a_fresh_salt_each_time() {
        let a = hash_password("admin123", COST).unwrap();
        let b = hash_password("admin123", COST).unwrap();

        assert_ne!(a, b);
        assert!(verify_password("admin123", &a).unwrap());
        assert!(verify_password("admin123", &b).unwrap());
    }

    #[test]
    fn stored_format_is_cost_digest_dot_salt() {
        let stored = hash_password("pw", COST).unwrap();
        let (head, salt) = stored.rsplit_once('.').unwrap();

        assert_eq!(salt.len(), 32);
        assert!(head.starts_with("4$"));
        assert_eq!(head.len(), "4$".len() + DIGEST_LEN);
    }

    #[test]
    fn malformed_values_never_match() {
        assert!(!verify_password("pw", "plaintext").unwrap());
        assert!(!verify_password("pw", "4$abc.zz").unwrap());
        assert!(!verify_password("pw", "x$abc.00112233445566778899aabbccddeeff").unwrap());
    }

    #[test]
    fn every_fresh_hash_verifies() {
        // Digests com '.' no meio não podem confundir a separação do salt
        let mut with_dot = 0;
        for _ in 0..200 {
            let stored = hash_password("admin123", COST).unwrap();
            let (head, _) = stored.rsplit_once('.').unwrap();
            if head.contains('.') {
                with_dot += 1;
            }
            assert!(verify_password("admin123", &stored).unwrap(), "{stored}");
            assert!(!verify_password("admin124", &stored).unwrap(), "{stored}");
        }
        assert!(with_dot > 0);
    }

    #[test]
    fn passwords_sharing_a_long_prefix_are_distinct() {
        let prefix = "a".repeat(60);
        let original = format!("{prefix}tail-one");
        let other = format!("{prefix}tail-two");

        let stored = hash_password(&original, COST).unwrap();
        assert!(verify_password(&original, &stored).unwrap());
        assert!(!verify_password(&other, &stored).unwrap());
    }

    #[test]
    fn passwords_over_the_limit_are_refused() {
        let long = "a".repeat(MAX_PASSWORD_BYTES + 8);
        assert!(matches!(hash_password(&long, COST), Err(AppError::BadRequest(_))));

        let stored = hash_password(&long[..MAX_PASSWORD_BYTES], COST).unwrap();
        assert!(verify_password(&long[..MAX_PASSWORD_BYTES], &stored).unwrap());
        assert!(!verify_password(&long, &stored).unwrap());
    }

    #[tokio::test]
    async fn blocking_wrappers_round_trip() {
        let stored = hash_password_blocking("pw".into(), COST).await.unwrap();
        assert!(verify_password_blocking("pw".into(), stored).await.unwrap());
    }
}
