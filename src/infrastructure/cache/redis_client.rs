// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use redis::{AsyncCommands, ErrorKind, RedisError, RedisResult, Script};
use std::sync::Arc;
use std::time::Duration;

use crate::domain::models::job::JobId;
use crate::utils::errors::StoreError;

/// 入队脚本：分配递增序号并写入有序集合，两步在服务端原子完成。
/// 成员以20位序号开头，同分值成员按字典序出队即为先进先出
const PUSH_SCRIPT: &str = r"
local seq = redis.call('INCR', KEYS[2])
redis.call('ZADD', KEYS[1], ARGV[1], string.format('%020d', seq) .. '|' .. ARGV[2])
return seq
";

// 去重与入队在同一脚本内完成，指纹已存在时返回 -1
const PUSH_UNSEEN_SCRIPT: &str = r"
if redis.call('SADD', KEYS[3], ARGV[3]) == 0 then
  return -1
end
local seq = redis.call('INCR', KEYS[2])
redis.call('ZADD', KEYS[1], ARGV[1], string.format('%020d', seq) .. '|' .. ARGV[2])
return seq
";

/// 每个任务在Redis中的键
#[derive(Debug, Clone, Default)]
pub struct KeySpace {
    prefix: String,
}

impl KeySpace {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// 请求队列（有序集合）
    pub fn requests(&self, job: &JobId) -> String {
        format!("{}{}:requests", self.prefix, job)
    }

    /// 去重指纹集合
    pub fn dupefilter(&self, job: &JobId) -> String {
        format!("{}{}:dupefilter", self.prefix, job)
    }

    /// 入队序号计数器
    pub fn sequence(&self, job: &JobId) -> String {
        format!("{}{}:seq", self.prefix, job)
    }
}

/// Redis客户端
///
/// 提供对Redis数据库的异步操作接口。每次调用单独取连接，
/// 阻塞出队不会拖住其他命令
#[derive(Clone)]
pub struct RedisClient {
    /// Redis客户端
    client: redis::Client,
    push_script: Arc<Script>,
    push_unseen_script: Arc<Script>,
}

impl RedisClient {
    /// 创建新的Redis客户端实例
    ///
    /// # 参数
    ///
    /// * `redis_url` - Redis连接URL
    pub fn new(redis_url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| StoreError::Fatal(format!("invalid redis url: {}", e)))?;
        Ok(Self {
            client,
            push_script: Arc::new(Script::new(PUSH_SCRIPT)),
            push_unseen_script: Arc::new(Script::new(PUSH_UNSEEN_SCRIPT)),
        })
    }

    async fn connection(&self) -> RedisResult<redis::aio::MultiplexedConnection> {
        self.client.get_multiplexed_async_connection().await
    }

    /// 连通性检查
    pub async fn ping(&self) -> RedisResult<()> {
        let mut con = self.connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut con).await?;
        Ok(())
    }

    /// 以给定分值写入条目，返回分配的序号
    pub async fn push_entry(
        &self,
        queue_key: &str,
        sequence_key: &str,
        score: f64,
        payload: &str,
    ) -> RedisResult<i64> {
        let mut con = self.connection().await?;
        self.push_script
            .key(queue_key)
            .key(sequence_key)
            .arg(score)
            .arg(payload)
            .invoke_async(&mut con)
            .await
    }

    /// 成员首次加入去重集合时写入条目
    ///
    /// # 返回值
    ///
    /// * `Ok(Some(seq))` - 已入队，返回分配的序号
    /// * `Ok(None)` - 成员已在去重集合中
    pub async fn push_entry_unseen(
        &self,
        queue_key: &str,
        sequence_key: &str,
        seen_key: &str,
        score: f64,
        payload: &str,
        member: &str,
    ) -> RedisResult<Option<i64>> {
        let mut con = self.connection().await?;
        let seq: i64 = self
            .push_unseen_script
            .key(queue_key)
            .key(sequence_key)
            .key(seen_key)
            .arg(score)
            .arg(payload)
            .arg(member)
            .invoke_async(&mut con)
            .await?;
        Ok((seq >= 0).then_some(seq))
    }

    /// 服务端阻塞弹出分值最小的成员
    ///
    /// # 返回值
    ///
    /// * `Ok(Some(member))` - 弹出的成员
    /// * `Ok(None)` - 超时时队列仍为空
    pub async fn pop_min_blocking(&self, key: &str, timeout: Duration) -> RedisResult<Option<String>> {
        let mut con = self.connection().await?;
        // 0 在Redis中表示无限等待
        let timeout_secs = timeout.as_secs_f64().max(0.001);
        let popped: Option<(String, String, f64)> = redis::cmd("BZPOPMIN")
            .arg(key)
            .arg(timeout_secs)
            .query_async(&mut con)
            .await?;
        Ok(popped.map(|(_, member, _)| member))
    }

    /// 有序集合长度
    pub async fn zcard(&self, key: &str) -> RedisResult<u64> {
        let mut con = self.connection().await?;
        con.zcard(key).await
    }

    /// 集合添加成员，首次添加返回 true
    pub async fn sadd(&self, key: &str, member: &str) -> RedisResult<bool> {
        let mut con = self.connection().await?;
        let added: i64 = con.sadd(key, member).await?;
        Ok(added == 1)
    }

    /// 成员是否存在
    pub async fn sismember(&self, key: &str, member: &str) -> RedisResult<bool> {
        let mut con = self.connection().await?;
        con.sismember(key, member).await
    }

    /// 集合大小
    pub async fn scard(&self, key: &str) -> RedisResult<u64> {
        let mut con = self.connection().await?;
        con.scard(key).await
    }

    /// 删除键
    pub async fn del(&self, keys: &[String]) -> RedisResult<()> {
        let mut con = self.connection().await?;
        con.del::<_, ()>(keys.to_vec()).await
    }
}

/// 将Redis错误归类为存储错误
///
/// 网络层错误与服务端临时状态（加载中、TRYAGAIN、集群下线）视为瞬时错误
pub fn classify_error(err: &RedisError) -> StoreError {
    let transient = err.is_io_error()
        || err.is_timeout()
        || err.is_connection_dropped()
        || err.is_connection_refusal()
        || matches!(
            err.kind(),
            ErrorKind::BusyLoadingError
                | ErrorKind::TryAgain
                | ErrorKind::ClusterDown
                | ErrorKind::MasterDown
        );

    if transient {
        StoreError::Transient(err.to_string())
    } else {
        StoreError::Fatal(err.to_string())
    }
}
